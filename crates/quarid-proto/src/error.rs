//! Error types for line framing and parsing.

use thiserror::Error;

/// Convenience alias for framing results.
pub type Result<T, E = ProtocolError> = std::result::Result<T, E>;

/// Framing-level failures. These are fatal to the stream they occur on.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProtocolError {
    /// I/O error while reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A line exceeded the configured maximum length.
    #[error("line too long: {actual} bytes (limit {limit})")]
    MessageTooLong {
        /// Bytes seen so far.
        actual: usize,
        /// Configured limit.
        limit: usize,
    },
}

/// A single line or identity string could not be interpreted.
///
/// Parse errors never tear down a connection; the offending line is
/// dropped and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The line was empty or only whitespace.
    #[error("empty line")]
    EmptyLine,

    /// A prefix was present but no command followed it.
    #[error("missing command in line {line:?}")]
    MissingCommand {
        /// The offending raw line.
        line: String,
    },

    /// An identity string without the `@` separator.
    #[error("invalid hostmask {0:?}: missing '@'")]
    InvalidHostmask(String),

    /// A wildcard pattern list that could not be compiled.
    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}
