//! RFC 1459 case folding.
//!
//! Nicknames and channel names are compared case-insensitively on IRC,
//! and under `rfc1459` the characters `[]\~` are the uppercase forms of
//! `{}|^`. Every key written to the account and channel tables goes
//! through [`irc_to_lower`] so that `Alice[m]` and `alice{m}` share one
//! account.

/// Fold one character.
#[inline]
pub const fn irc_lower_char(c: char) -> char {
    match c {
        'A'..='Z' => (c as u8 + 32) as char,
        '[' => '{',
        ']' => '}',
        '\\' => '|',
        '~' => '^',
        _ => c,
    }
}

/// Fold a whole string.
pub fn irc_to_lower(s: &str) -> String {
    s.chars().map(irc_lower_char).collect()
}

/// Case-insensitive equality under RFC 1459 folding.
pub fn irc_eq(a: &str, b: &str) -> bool {
    a.len() == b.len()
        && a
            .chars()
            .zip(b.chars())
            .all(|(x, y)| irc_lower_char(x) == irc_lower_char(y))
}
