//! Newline-delimited framing.
//!
//! Accepts `\n` or `\r\n` terminators. Bytes are decoded as UTF-8 with
//! invalid sequences replaced, since networks routinely carry text in
//! legacy encodings and one bad byte must not end the session.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ProtocolError, Result};

/// Default cap on a single inbound line: 512 bytes of message plus room
/// for IRCv3 tags.
pub const DEFAULT_MAX_LINE_LEN: usize = 8191;

/// Line framing codec.
#[derive(Debug)]
pub struct LineCodec {
    /// Where the newline search resumes on the next call.
    next_index: usize,
    max_len: usize,
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl LineCodec {
    /// Codec with [`DEFAULT_MAX_LINE_LEN`].
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Codec with a custom cap.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
        }
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>> {
        match src[self.next_index..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let line = src.split_to(self.next_index + offset + 1);
                self.next_index = 0;

                if line.len() > self.max_len {
                    return Err(ProtocolError::MessageTooLong {
                        actual: line.len(),
                        limit: self.max_len,
                    });
                }

                let text = String::from_utf8_lossy(&line);
                Ok(Some(text.trim_end_matches(['\r', '\n']).to_string()))
            }
            None => {
                self.next_index = src.len();
                if src.len() > self.max_len {
                    return Err(ProtocolError::MessageTooLong {
                        actual: src.len(),
                        limit: self.max_len,
                    });
                }
                Ok(None)
            }
        }
    }
}

impl Encoder<String> for LineCodec {
    type Error = ProtocolError;

    fn encode(&mut self, line: String, dst: &mut BytesMut) -> Result<()> {
        dst.extend_from_slice(line.as_bytes());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_lf_and_crlf() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from("PING :a\r\nPING :b\nPART");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :a"));
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PING :b"));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);

        buf.extend_from_slice(b" #x\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap().as_deref(), Some("PART #x"));
        assert!(buf.is_empty());
    }

    #[test]
    fn invalid_utf8_is_replaced() {
        let mut codec = LineCodec::new();
        let mut buf = BytesMut::from(&b"PRIVMSG #c :caf\xe9\r\n"[..]);
        let line = codec.decode(&mut buf).unwrap().unwrap();
        assert!(line.starts_with("PRIVMSG #c :caf"));
        assert!(line.ends_with('\u{FFFD}'));
    }

    #[test]
    fn overlong_lines_are_rejected() {
        let mut codec = LineCodec::with_max_len(16);
        let mut buf = BytesMut::from("PRIVMSG #channel :this is far too long\r\n");
        assert!(matches!(
            codec.decode(&mut buf),
            Err(ProtocolError::MessageTooLong { limit: 16, .. })
        ));
    }

    #[test]
    fn overlong_partial_lines_are_rejected_early() {
        let mut codec = LineCodec::with_max_len(8);
        let mut buf = BytesMut::from("0123456789");
        assert!(codec.decode(&mut buf).is_err());
    }
}
