use quarid_proto::{ChannelExt, Event};

use crate::client::Responder;
use crate::error::ConnectionError;

/// A parsed request to run one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Upper-case command name, prefix removed.
    pub name: String,
    pub args: Vec<String>,
    /// Channel the message was sent to; empty for private messages.
    pub channel: String,
    /// Full `nick!user@host` of the sender.
    pub identity: String,
}

impl CommandInvocation {
    /// Parse chat `text` sent by `origin` to `target`.
    ///
    /// The first token must start with `prefix` in channels and in
    /// private messages alike. Returns `None` when it does not, or when
    /// nothing follows the prefix.
    pub fn parse(prefix: &str, origin: &str, target: &str, text: &str) -> Option<Self> {
        let mut tokens = text.split_whitespace();
        let name = tokens.next()?.strip_prefix(prefix)?;
        if name.is_empty() {
            return None;
        }

        let channel = if target.is_channel_name() {
            target.to_string()
        } else {
            String::new()
        };
        Some(Self {
            name: name.to_uppercase(),
            args: tokens.map(str::to_string).collect(),
            channel,
            identity: origin.to_string(),
        })
    }

    /// Sender's nick.
    pub fn nick(&self) -> &str {
        self.identity
            .split_once('!')
            .map_or(self.identity.as_str(), |(nick, _)| nick)
    }

    pub fn is_private(&self) -> bool {
        self.channel.is_empty()
    }

    /// Argument `i`, if given.
    pub fn arg(&self, i: usize) -> Option<&str> {
        self.args.get(i).map(String::as_str)
    }

    /// Reply to the caller: `nick: text` in the channel, or a direct
    /// message when invoked privately.
    pub async fn respond(&self, responder: &Responder, text: &str) -> Result<(), ConnectionError> {
        if self.is_private() {
            responder.privmsg(self.nick(), text).await
        } else {
            let line = format!("{}: {}", self.nick(), text);
            responder.privmsg(&self.channel, &line).await
        }
    }

    /// Plain message to the channel. No-op in private.
    pub async fn message(&self, responder: &Responder, text: &str) -> Result<(), ConnectionError> {
        if self.is_private() {
            return Ok(());
        }
        responder.privmsg(&self.channel, text).await
    }

    /// `/me` in the channel. No-op in private.
    pub async fn action(&self, responder: &Responder, text: &str) -> Result<(), ConnectionError> {
        if self.is_private() {
            return Ok(());
        }
        responder.action(&self.channel, text).await
    }

    /// Mode change on the channel. No-op in private.
    pub async fn chan_mode(
        &self,
        responder: &Responder,
        mode: &str,
        arg: &str,
    ) -> Result<(), ConnectionError> {
        if self.is_private() {
            return Ok(());
        }
        responder.mode(&self.channel, mode, arg).await
    }
}

/// Target and text of a `PRIVMSG`, if it has both.
pub(crate) fn privmsg_parts(event: &Event) -> Option<(&str, &str)> {
    match event.params.as_slice() {
        [target, .., text] => Some((target.as_str(), text.as_str())),
        _ => None,
    }
}
