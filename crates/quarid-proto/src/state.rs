//! Sans-IO client registration state machine.
//!
//! [`Handshake`] performs no I/O. The connection driver feeds it every
//! decoded [`Event`] in arrival order and carries out the returned
//! [`HandshakeAction`]s: sending lines, recording the registered nick,
//! or tearing the connection down. Keeping it pure means the whole
//! registration flow, collision recovery included, is testable without a
//! socket.
//!
//! ```
//! use quarid_proto::{ConnectionState, Event, Handshake, HandshakeAction, HandshakeConfig};
//!
//! let mut hs = Handshake::new(HandshakeConfig::new("quarid", "quarid", "Quarid"));
//! hs.connecting();
//! let actions = hs.start();
//! assert_eq!(actions.len(), 2);
//! assert_eq!(hs.state(), ConnectionState::Authenticating);
//!
//! let welcome: Event = ":srv 001 quarid :Welcome".parse().unwrap();
//! let actions = hs.feed(&welcome, || "abc".into());
//! assert!(matches!(actions[0], HandshakeAction::Registered { .. }));
//! assert_eq!(hs.state(), ConnectionState::Registered);
//! ```

use std::fmt;

use crate::command;
use crate::event::Event;
use crate::nick::collision_nick;

/// Where the connection is in its lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No transport. Initial and terminal.
    #[default]
    Disconnected,
    /// Dialing the server.
    Connecting,
    /// NICK/USER sent, waiting for the welcome numeric.
    Authenticating,
    /// Welcome received.
    Registered,
    /// A "nickname in use" reply is being handled.
    CollisionRecovery,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Authenticating => "authenticating",
            Self::Registered => "registered",
            Self::CollisionRecovery => "collision-recovery",
        };
        f.write_str(s)
    }
}

/// Identity the client registers with.
#[derive(Clone, Debug)]
pub struct HandshakeConfig {
    /// Desired nickname.
    pub nick: String,
    /// Username (ident).
    pub ident: String,
    /// Real name / GECOS.
    pub realname: String,
    /// Give up after this many consecutive collisions. `None` retries forever.
    pub nick_retry_limit: Option<u32>,
}

impl HandshakeConfig {
    /// Config with unbounded collision retries.
    pub fn new(nick: &str, ident: &str, realname: &str) -> Self {
        Self {
            nick: nick.to_string(),
            ident: ident.to_string(),
            realname: realname.to_string(),
            nick_retry_limit: None,
        }
    }
}

/// What the driver must do in response to an event.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandshakeAction {
    /// Write this event to the server.
    Send(Event),
    /// The nickname in use changed.
    NickChanged {
        /// Previous nick.
        from: String,
        /// New nick.
        to: String,
    },
    /// The server accepted registration under `nick`.
    Registered {
        /// Nick the server confirmed.
        nick: String,
    },
    /// Close the connection.
    Terminate(String),
}

/// Registration state machine.
#[derive(Clone, Debug)]
pub struct Handshake {
    config: HandshakeConfig,
    state: ConnectionState,
    nick: String,
    collisions: u32,
}

impl Handshake {
    /// New machine in the `Disconnected` state.
    pub fn new(config: HandshakeConfig) -> Self {
        let nick = config.nick.clone();
        Self {
            config,
            state: ConnectionState::Disconnected,
            nick,
            collisions: 0,
        }
    }

    /// Current state.
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Nick currently claimed.
    pub fn nick(&self) -> &str {
        &self.nick
    }

    /// The dial is in progress.
    pub fn connecting(&mut self) {
        self.state = ConnectionState::Connecting;
        self.nick = self.config.nick.clone();
        self.collisions = 0;
    }

    /// Transport is up: claim the nick and register.
    #[must_use]
    pub fn start(&mut self) -> Vec<HandshakeAction> {
        self.state = ConnectionState::Authenticating;
        vec![
            HandshakeAction::Send(Event::nick(&self.nick)),
            HandshakeAction::Send(Event::user(&self.config.ident, &self.config.realname)),
        ]
    }

    /// Transport is gone.
    pub fn disconnected(&mut self) {
        self.state = ConnectionState::Disconnected;
    }

    /// Feed one inbound event.
    ///
    /// `suffix` is called only when a new collision nick is needed.
    #[must_use]
    pub fn feed<F>(&mut self, event: &Event, suffix: F) -> Vec<HandshakeAction>
    where
        F: FnOnce() -> String,
    {
        if self.state == ConnectionState::Disconnected {
            return Vec::new();
        }

        match event.command.to_ascii_uppercase().as_str() {
            command::PING => vec![HandshakeAction::Send(Event::pong(&event.params))],
            command::ERR_NICKNAMEINUSE | command::ERR_ERRONEUSNICKNAME => {
                self.recover_collision(suffix)
            }
            command::RPL_WELCOME if self.state == ConnectionState::Authenticating => {
                self.state = ConnectionState::Registered;
                self.collisions = 0;
                if let Some(nick) = event.param(0) {
                    self.nick = nick.to_string();
                }
                vec![HandshakeAction::Registered {
                    nick: self.nick.clone(),
                }]
            }
            command::NICK if crate::casemap::irc_eq(event.origin_nick(), &self.nick) => {
                match event.param(0) {
                    Some(to) => {
                        let from = std::mem::replace(&mut self.nick, to.to_string());
                        vec![HandshakeAction::NickChanged {
                            from,
                            to: to.to_string(),
                        }]
                    }
                    None => Vec::new(),
                }
            }
            command::ERROR => {
                self.state = ConnectionState::Disconnected;
                let reason = event.trailing().unwrap_or("closing link").to_string();
                vec![HandshakeAction::Terminate(reason)]
            }
            _ => Vec::new(),
        }
    }

    fn recover_collision<F>(&mut self, suffix: F) -> Vec<HandshakeAction>
    where
        F: FnOnce() -> String,
    {
        if !matches!(
            self.state,
            ConnectionState::Authenticating | ConnectionState::Registered
        ) {
            return Vec::new();
        }
        self.state = ConnectionState::CollisionRecovery;
        self.collisions += 1;

        if let Some(limit) = self.config.nick_retry_limit {
            if self.collisions > limit {
                self.state = ConnectionState::Disconnected;
                return vec![HandshakeAction::Terminate(format!(
                    "nickname still in use after {limit} attempts"
                ))];
            }
        }

        let to = collision_nick(&self.nick, &suffix());
        let from = std::mem::replace(&mut self.nick, to.clone());
        self.state = ConnectionState::Authenticating;
        vec![
            HandshakeAction::NickChanged {
                from,
                to: to.clone(),
            },
            HandshakeAction::Send(Event::nick(&to)),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn started() -> Handshake {
        let mut hs = Handshake::new(HandshakeConfig::new("quarid", "qd", "Quarid Services"));
        hs.connecting();
        let _ = hs.start();
        hs
    }

    fn ev(line: &str) -> Event {
        line.parse().unwrap()
    }

    #[test]
    fn start_sends_nick_then_user() {
        let mut hs = Handshake::new(HandshakeConfig::new("quarid", "qd", "Quarid Services"));
        assert_eq!(hs.state(), ConnectionState::Disconnected);
        hs.connecting();
        assert_eq!(hs.state(), ConnectionState::Connecting);
        let actions = hs.start();
        assert_eq!(
            actions,
            vec![
                HandshakeAction::Send(Event::nick("quarid")),
                HandshakeAction::Send(Event::user("qd", "Quarid Services")),
            ]
        );
        assert_eq!(hs.state(), ConnectionState::Authenticating);
    }

    #[test]
    fn ping_is_answered_in_any_live_state() {
        let mut hs = started();
        let actions = hs.feed(&ev("PING :abc"), || unreachable!());
        assert_eq!(actions, vec![HandshakeAction::Send(ev("PONG abc"))]);

        let _ = hs.feed(&ev(":srv 001 quarid :hi"), || unreachable!());
        let actions = hs.feed(&ev("PING :def"), || unreachable!());
        assert_eq!(actions, vec![HandshakeAction::Send(ev("PONG def"))]);
    }

    #[test]
    fn lowercase_commands_are_recognised() {
        let mut hs = started();
        let actions = hs.feed(&ev("ping :abc"), || unreachable!());
        assert_eq!(actions, vec![HandshakeAction::Send(ev("PONG abc"))]);
        let actions = hs.feed(&ev("error :bye"), || unreachable!());
        assert_eq!(actions, vec![HandshakeAction::Terminate("bye".to_string())]);
    }

    #[test]
    fn nothing_happens_while_disconnected() {
        let mut hs = Handshake::new(HandshakeConfig::new("quarid", "qd", "Q"));
        assert!(hs.feed(&ev("PING :abc"), || unreachable!()).is_empty());
    }

    #[test]
    fn collision_rewrites_nick_and_resends() {
        let mut hs = started();
        let actions = hs.feed(
            &ev(":srv 433 * quarid :Nickname is already in use"),
            || "x1y".to_string(),
        );
        assert_eq!(
            actions,
            vec![
                HandshakeAction::NickChanged {
                    from: "quarid".into(),
                    to: "quari_x1y".into()
                },
                HandshakeAction::Send(Event::nick("quari_x1y")),
            ]
        );
        assert_eq!(hs.nick(), "quari_x1y");
        assert_eq!(hs.state(), ConnectionState::Authenticating);
    }

    #[test]
    fn repeated_collisions_are_unbounded_by_default() {
        let mut hs = started();
        for i in 0..20 {
            let actions = hs.feed(&ev(":srv 433 * x :in use"), || format!("{i:03}"));
            assert!(matches!(actions.last(), Some(HandshakeAction::Send(_))));
        }
        assert_eq!(hs.state(), ConnectionState::Authenticating);
    }

    #[test]
    fn retry_limit_terminates() {
        let mut cfg = HandshakeConfig::new("quarid", "qd", "Q");
        cfg.nick_retry_limit = Some(2);
        let mut hs = Handshake::new(cfg);
        hs.connecting();
        let _ = hs.start();

        let _ = hs.feed(&ev(":srv 433 * a :in use"), || "aaa".into());
        let _ = hs.feed(&ev(":srv 433 * b :in use"), || "bbb".into());
        let actions = hs.feed(&ev(":srv 433 * c :in use"), || "ccc".into());
        assert!(matches!(actions[..], [HandshakeAction::Terminate(_)]));
        assert_eq!(hs.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn welcome_registers_with_confirmed_nick() {
        let mut hs = started();
        let _ = hs.feed(&ev(":srv 433 * quarid :in use"), || "abc".into());
        let actions = hs.feed(&ev(":srv 001 quari_abc :Welcome"), || unreachable!());
        assert_eq!(
            actions,
            vec![HandshakeAction::Registered {
                nick: "quari_abc".into()
            }]
        );
        assert_eq!(hs.state(), ConnectionState::Registered);
    }

    #[test]
    fn server_nick_change_is_tracked() {
        let mut hs = started();
        let _ = hs.feed(&ev(":srv 001 quarid :Welcome"), || unreachable!());
        let actions = hs.feed(&ev(":quarid!qd@host NICK :Guest42"), || unreachable!());
        assert_eq!(
            actions,
            vec![HandshakeAction::NickChanged {
                from: "quarid".into(),
                to: "Guest42".into()
            }]
        );
        assert_eq!(hs.nick(), "Guest42");
    }

    #[test]
    fn other_users_nick_changes_are_ignored() {
        let mut hs = started();
        assert!(hs
            .feed(&ev(":alice!a@h NICK bob"), || unreachable!())
            .is_empty());
        assert_eq!(hs.nick(), "quarid");
    }

    #[test]
    fn error_terminates() {
        let mut hs = started();
        let actions = hs.feed(&ev("ERROR :Closing Link: (Ping timeout)"), || unreachable!());
        assert_eq!(
            actions,
            vec![HandshakeAction::Terminate(
                "Closing Link: (Ping timeout)".into()
            )]
        );
        assert_eq!(hs.state(), ConnectionState::Disconnected);
    }
}
