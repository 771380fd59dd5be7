//! Identity decomposition and wildcard host matching.
//!
//! An identity string looks like `nick!user@host`. Admin lists use the
//! same shape with wildcards, and the shorthand `*@host` stands for
//! `*!*@host`.
//!
//! Wildcard lists are compiled into one anchored alternation: every
//! literal character is escaped, `*` becomes `.*` and `?` becomes `.`.
//! Matching is case-insensitive since hostnames are.

use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::casemap::irc_eq;
use crate::error::ParseError;

/// The `{nick, user, host}` decomposition of an identity.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HostMask {
    /// Nickname, or `*`.
    pub nick: String,
    /// Ident / username, or `*`.
    pub user: String,
    /// Hostname or host pattern.
    pub host: String,
}

impl HostMask {
    /// Parse `nick!user@host`, or `*@host` as the any-nick sentinel.
    pub fn parse(identity: &str) -> Result<Self, ParseError> {
        let invalid = || ParseError::InvalidHostmask(identity.to_string());

        let (left, host) = identity.split_once('@').ok_or_else(invalid)?;
        let (nick, user) = match left.split_once('!') {
            Some((nick, user)) => (nick, user),
            None if left == "*" => ("*", "*"),
            None => return Err(invalid()),
        };

        Ok(Self {
            nick: nick.to_string(),
            user: user.to_string(),
            host: host.to_string(),
        })
    }

    /// The identity with the nick segment removed: `user@host`.
    ///
    /// Sessions are scoped to this so a login survives a nick change on
    /// the same connection but not a reconnect from elsewhere.
    pub fn suffix(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }

    /// True when this mask's nick and user fields admit `other`.
    ///
    /// A `*` field admits anything; otherwise the nick is compared with
    /// IRC case folding and the user exactly.
    pub fn admits(&self, other: &HostMask) -> bool {
        (self.nick == "*" || irc_eq(&self.nick, &other.nick))
            && (self.user == "*" || self.user == other.user)
    }
}

impl FromStr for HostMask {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for HostMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}@{}", self.nick, self.user, self.host)
    }
}

/// Translate one wildcard pattern to regex syntax.
fn wildcard_to_regex(pattern: &str) -> String {
    pattern
        .split('*')
        .map(|many| {
            many.split('?')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".")
        })
        .collect::<Vec<_>>()
        .join(".*")
}

/// Compile a list of wildcard patterns into one anchored matcher.
///
/// Returns `Ok(None)` for an empty list: an empty list matches nothing.
pub fn compile_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Option<Regex>, ParseError> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let alternation = patterns
        .iter()
        .map(|p| wildcard_to_regex(p.as_ref()))
        .collect::<Vec<_>>()
        .join("|");

    RegexBuilder::new(&format!("^(?:{alternation})$"))
        .case_insensitive(true)
        .build()
        .map(Some)
        .map_err(|e| ParseError::InvalidPattern(e.to_string()))
}

/// True when the host of `identity` matches any of the wildcard `patterns`.
///
/// Unparseable identities and empty pattern lists never match.
pub fn matches_any<S: AsRef<str>>(identity: &str, patterns: &[S]) -> bool {
    let Ok(mask) = HostMask::parse(identity) else {
        return false;
    };
    match compile_patterns(patterns) {
        Ok(Some(re)) => re.is_match(&mask.host),
        _ => false,
    }
}

/// True when `identity` is covered by one of the full `nick!user@host`
/// admin masks.
///
/// Each mask first filters on nick and user (`*` or an exact match);
/// the hosts of the surviving masks are then matched as wildcards.
/// Malformed admin masks are skipped.
pub fn matches_admin<S: AsRef<str>>(identity: &str, admin_masks: &[S]) -> bool {
    let Ok(who) = HostMask::parse(identity) else {
        return false;
    };

    let hosts: Vec<String> = admin_masks
        .iter()
        .filter_map(|m| HostMask::parse(m.as_ref()).ok())
        .filter(|m| m.admits(&who))
        .map(|m| m.host)
        .collect();

    match compile_patterns(&hosts) {
        Ok(Some(re)) => re.is_match(&who.host),
        _ => false,
    }
}
