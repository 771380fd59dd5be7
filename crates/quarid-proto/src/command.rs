//! Command tokens and numerics the client speaks.

/// Identity claim.
pub const NICK: &str = "NICK";
/// Registration (ident, mode, unused, realname).
pub const USER: &str = "USER";
/// Liveness check from the server.
pub const PING: &str = "PING";
/// Liveness reply.
pub const PONG: &str = "PONG";
/// Leave the network.
pub const QUIT: &str = "QUIT";
/// Join a channel.
pub const JOIN: &str = "JOIN";
/// Change a channel or user mode.
pub const MODE: &str = "MODE";
/// Chat message, channel or direct.
pub const PRIVMSG: &str = "PRIVMSG";
/// Notice, never answered automatically.
pub const NOTICE: &str = "NOTICE";
/// Gain IRC operator status.
pub const OPER: &str = "OPER";
/// Server-issued termination.
pub const ERROR: &str = "ERROR";

/// Registration complete.
pub const RPL_WELCOME: &str = "001";
/// Server name, version and supported modes.
pub const RPL_MYINFO: &str = "004";
/// Granted IRC operator status.
pub const RPL_YOUREOPER: &str = "381";
/// Nickname rejected as malformed.
pub const ERR_ERRONEUSNICKNAME: &str = "432";
/// Nickname already taken.
pub const ERR_NICKNAMEINUSE: &str = "433";
/// OPER credentials rejected.
pub const ERR_PASSWDMISMATCH: &str = "464";

/// CTCP delimiter wrapping `ACTION` payloads.
pub const CTCP_DELIM: char = '\x01';
