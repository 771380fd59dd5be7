//! Channel name helpers.

/// Characters that start a channel name on the networks quarid targets.
pub const CHANNEL_SIGILS: [char; 2] = ['#', '&'];

/// Longest channel name accepted for registration.
pub const CHANNEL_MAX_LEN: usize = 50;

/// Extension trait for telling channel targets apart from nicknames.
pub trait ChannelExt {
    /// True when the string starts with a channel sigil.
    ///
    /// This is the check used to decide whether a `PRIVMSG` arrived in a
    /// channel or as a direct message.
    fn is_channel_name(&self) -> bool;

    /// True when the string is a channel name that can be registered:
    /// it starts with a sigil, has at least one more character, is at most
    /// [`CHANNEL_MAX_LEN`] characters, and contains no space, comma, BEL
    /// or other control characters.
    fn is_valid_channel(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        self.starts_with(CHANNEL_SIGILS)
    }

    fn is_valid_channel(&self) -> bool {
        if !self.is_channel_name() {
            return false;
        }
        let len = self.chars().count();
        if len < 2 || len > CHANNEL_MAX_LEN {
            return false;
        }
        !self.chars().any(|c| c == ' ' || c == ',' || c.is_control())
    }
}

impl ChannelExt for String {
    fn is_channel_name(&self) -> bool {
        self.as_str().is_channel_name()
    }

    fn is_valid_channel(&self) -> bool {
        self.as_str().is_valid_channel()
    }
}
