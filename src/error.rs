//! Unified error handling for quarid.
//!
//! Three layers, matching how far a failure is allowed to travel:
//! transport failures end the connection, authorization failures become
//! a chat reply, and everything a handler returns is logged at the
//! dispatcher boundary.

use std::time::Duration;

use quarid_proto::ProtocolError;
use thiserror::Error;

use crate::db::StoreError;
use crate::plugins::PluginError;

// ============================================================================
// Transport Errors (fatal to the connection)
// ============================================================================

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("tls setup failed: {0}")]
    Tls(String),

    #[error("invalid server name: {0}")]
    InvalidServerName(String),

    #[error("connect timed out after {0:?}")]
    Timeout(Duration),

    #[error("already connected")]
    AlreadyConnected,

    /// The transport is gone; in-flight writes land here.
    #[error("connection closed")]
    Closed,
}

// ============================================================================
// Authorization Errors (user-facing, never fatal)
// ============================================================================

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("no such account")]
    NoSuchAccount,

    #[error("incorrect password")]
    BadPassword,

    #[error("already registered")]
    AlreadyRegistered,

    #[error("password must be at least {min} characters")]
    WeakPassword { min: usize },

    #[error("no such channel")]
    NoSuchChannel,

    #[error("no permission")]
    NoPermission,

    #[error("not logged in")]
    NotLoggedIn,

    /// The caller's identity string is not `nick!user@host`.
    #[error("invalid identity: {0}")]
    InvalidIdentity(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl AuthError {
    /// Static label for structured logging.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoSuchAccount => "no_such_account",
            Self::BadPassword => "bad_password",
            Self::AlreadyRegistered => "already_registered",
            Self::WeakPassword { .. } => "weak_password",
            Self::NoSuchChannel => "no_such_channel",
            Self::NoPermission => "no_permission",
            Self::NotLoggedIn => "not_logged_in",
            Self::InvalidIdentity(_) => "invalid_identity",
            Self::Store(_) => "store_error",
        }
    }
}

// ============================================================================
// Handler Errors (contained at the dispatcher)
// ============================================================================

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("transport: {0}")]
    Connection(#[from] ConnectionError),

    #[error("authorization: {0}")]
    Auth(#[from] AuthError),

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("plugin: {0}")]
    Plugin(#[from] PluginError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    /// Static label for structured logging.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Connection(ConnectionError::Closed) => "connection_closed",
            Self::Connection(_) => "transport_error",
            Self::Auth(e) => e.error_code(),
            Self::Store(_) => "store_error",
            Self::Plugin(_) => "plugin_error",
            Self::Internal(_) => "internal_error",
        }
    }
}
