//! The decoded unit of the wire protocol.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};

use crate::command;
use crate::error::ParseError;

/// One protocol line, decoded.
///
/// `origin` is the prefix without its `:` sigil and may be empty. The last
/// entry of `params` may contain spaces when it came from a trailing
/// parameter. `received_at` is stamped on decode (or construction) and is
/// ignored by equality, so a re-parsed event compares equal to its source.
#[derive(Clone, Debug)]
pub struct Event {
    /// Sender identity (`nick!user@host` or a server name), or empty.
    pub origin: String,
    /// Command token or three-digit numeric, never empty.
    pub command: String,
    /// Ordered parameters; the final one may contain spaces.
    pub params: Vec<String>,
    /// When the event was decoded or built.
    pub received_at: DateTime<Utc>,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.command == other.command && self.params == other.params
    }
}

impl Eq for Event {}

impl Event {
    /// Build an outbound event with no origin.
    pub fn new<C, I, P>(command: C, params: I) -> Self
    where
        C: Into<String>,
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        Self {
            origin: String::new(),
            command: command.into(),
            params: params.into_iter().map(Into::into).collect(),
            received_at: Utc::now(),
        }
    }

    /// Attach an origin, mostly useful for building inbound events in tests.
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// `NICK nick`
    pub fn nick(nick: &str) -> Self {
        Self::new(command::NICK, [nick])
    }

    /// `USER ident 0 * :realname`
    pub fn user(ident: &str, realname: &str) -> Self {
        Self::new(command::USER, [ident, "0", "*", realname])
    }

    /// Answer a `PING` with the same parameters.
    pub fn pong(params: &[String]) -> Self {
        Self::new(command::PONG, params.iter().cloned())
    }

    /// `QUIT :reason`
    pub fn quit(reason: &str) -> Self {
        Self::new(command::QUIT, [reason])
    }

    /// `JOIN #channel`
    pub fn join(channel: &str) -> Self {
        Self::new(command::JOIN, [channel])
    }

    /// `MODE #channel +o nick`
    pub fn mode(channel: &str, mode: &str, arg: &str) -> Self {
        Self::new(command::MODE, [channel, mode, arg])
    }

    /// `OPER name password`
    pub fn oper(name: &str, password: &str) -> Self {
        Self::new(command::OPER, [name, password])
    }

    /// `PRIVMSG target :text`
    pub fn privmsg(target: &str, text: &str) -> Self {
        Self::new(command::PRIVMSG, [target, text])
    }

    /// A CTCP `ACTION` (`/me`) sent as a `PRIVMSG`.
    pub fn action(target: &str, text: &str) -> Self {
        let body = format!("{d}ACTION {text}{d}", d = command::CTCP_DELIM);
        Self::new(command::PRIVMSG, [target, body.as_str()])
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// The final parameter, which carries message text for `PRIVMSG`.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// First parameter: the target of `PRIVMSG`, `MODE`, `JOIN` and friends.
    pub fn target(&self) -> Option<&str> {
        self.param(0)
    }

    /// Nick part of the origin (everything before `!`).
    pub fn origin_nick(&self) -> &str {
        match self.origin.split_once('!') {
            Some((nick, _)) => nick,
            None => &self.origin,
        }
    }

    /// True for the given command, compared ASCII case-insensitively.
    pub fn is(&self, command: &str) -> bool {
        self.command.eq_ignore_ascii_case(command)
    }

    /// Serialize for the wire: one line, CRLF-terminated.
    ///
    /// Anything after an embedded CR or LF is dropped, so a single
    /// encoded event can never smuggle a second protocol line.
    pub fn encode(&self) -> String {
        let mut line = self.to_string();
        if let Some(pos) = line.find(['\r', '\n']) {
            line.truncate(pos);
        }
        line.push_str("\r\n");
        line
    }
}

impl FromStr for Event {
    type Err = ParseError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut tokens = line.split(' ').filter(|t| !t.is_empty());

        let first = tokens.next().ok_or(ParseError::EmptyLine)?;
        let (origin, command) = match first.strip_prefix(':') {
            Some(origin) => {
                let command = tokens.next().ok_or_else(|| ParseError::MissingCommand {
                    line: line.to_string(),
                })?;
                (origin.to_string(), command)
            }
            None => (String::new(), first),
        };

        let mut params = Vec::new();
        while let Some(token) = tokens.next() {
            if let Some(head) = token.strip_prefix(':') {
                let mut trailing = head.to_string();
                for rest in tokens.by_ref() {
                    trailing.push(' ');
                    trailing.push_str(rest);
                }
                params.push(trailing);
                break;
            }
            params.push(token.to_string());
        }

        Ok(Self {
            origin,
            command: command.to_string(),
            params,
            received_at: Utc::now(),
        })
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.origin.is_empty() {
            write!(f, ":{} ", self.origin)?;
        }
        f.write_str(&self.command)?;

        let count = self.params.len();
        for (i, param) in self.params.iter().enumerate() {
            let last = i + 1 == count;
            let needs_sigil =
                count > 1 || param.is_empty() || param.contains(' ') || param.starts_with(':');
            if last && needs_sigil {
                write!(f, " :{param}")?;
            } else {
                write!(f, " {param}")?;
            }
        }
        Ok(())
    }
}
