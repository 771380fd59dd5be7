//! Nickname helpers.

/// Longest nickname every server is required to accept (RFC 2812).
pub const MIN_GUARANTEED_NICK_LEN: usize = 9;

/// Length of the random suffix appended on a collision.
pub const COLLISION_SUFFIX_LEN: usize = 3;

/// Derive the nick to try after `nick` was reported as in use.
///
/// The result is `base_suffix`, where `base` is `nick` cut short enough
/// that the whole thing fits in [`MIN_GUARANTEED_NICK_LEN`] characters.
/// Any earlier collision suffix is stripped first so repeated collisions
/// do not eat into the base.
///
/// ```
/// use quarid_proto::collision_nick;
///
/// assert_eq!(collision_nick("quarid", "x7q"), "quari_x7q");
/// assert_eq!(collision_nick("bot", "a1b"), "bot_a1b");
/// assert_eq!(collision_nick("bot_a1b", "zzz"), "bot_zzz");
/// ```
pub fn collision_nick(nick: &str, suffix: &str) -> String {
    let base = strip_collision_suffix(nick);
    let room = MIN_GUARANTEED_NICK_LEN.saturating_sub(suffix.chars().count() + 1);
    let base: String = base.chars().take(room.max(1)).collect();
    let candidate = format!("{base}_{suffix}");
    candidate.chars().take(MIN_GUARANTEED_NICK_LEN).collect()
}

fn strip_collision_suffix(nick: &str) -> &str {
    match nick.rsplit_once('_') {
        Some((base, tail))
            if !base.is_empty()
                && tail.chars().count() == COLLISION_SUFFIX_LEN
                && tail.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            base
        }
        _ => nick,
    }
}
