//! # quarid-proto
//!
//! Protocol building blocks for the quarid IRC services bot.
//!
//! The crate knows how IRC lines look on the wire and how a client
//! registers with a server, but nothing about services, accounts or
//! storage. Everything here is either pure (parsing, matching, the
//! handshake state machine) or thin tokio glue (line framing, split
//! transport halves).
//!
//! ## Parsing and encoding
//!
//! ```rust
//! use quarid_proto::Event;
//!
//! let event: Event = ":alice!~a@example.com PRIVMSG #chat :hello there"
//!     .parse()
//!     .unwrap();
//! assert_eq!(event.origin, "alice!~a@example.com");
//! assert_eq!(event.command, "PRIVMSG");
//! assert_eq!(event.params, vec!["#chat", "hello there"]);
//! assert_eq!(event.origin_nick(), "alice");
//!
//! let reply = Event::privmsg("#chat", "hi alice");
//! assert_eq!(reply.to_string(), "PRIVMSG #chat :hi alice");
//! ```
//!
//! ## Hostmask matching
//!
//! ```rust
//! use quarid_proto::hostmask::matches_any;
//!
//! let admins = vec!["*.example.com".to_string()];
//! assert!(matches_any("bob!~b@staff.example.com", &admins));
//! assert!(!matches_any("bob!~b@example.org", &admins));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod command;
pub mod error;
pub mod event;
pub mod hostmask;
pub mod nick;
pub mod state;

#[cfg(feature = "tokio")]
pub mod codec;
#[cfg(feature = "tokio")]
pub mod line;
#[cfg(feature = "tokio")]
pub mod transport;

pub use self::casemap::{irc_eq, irc_to_lower};
pub use self::chan::ChannelExt;
pub use self::error::{ParseError, ProtocolError};
pub use self::event::Event;
pub use self::hostmask::HostMask;
pub use self::nick::collision_nick;
pub use self::state::{ConnectionState, Handshake, HandshakeAction, HandshakeConfig};

#[cfg(feature = "tokio")]
pub use self::codec::EventCodec;
#[cfg(feature = "tokio")]
pub use self::line::LineCodec;
#[cfg(feature = "tokio")]
pub use self::transport::{TransportReadHalf, TransportStream, TransportWriteHalf};
