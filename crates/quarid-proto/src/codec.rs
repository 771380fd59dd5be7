//! Event codec for tokio framing.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{ParseError, ProtocolError, Result};
use crate::event::Event;
use crate::line::LineCodec;

/// Frames lines with [`LineCodec`] and parses each into an [`Event`].
///
/// A line that fails to parse is yielded as `Err(ParseError)` inside the
/// item rather than as a codec error, so the stream survives it and the
/// reader decides whether to log or drop. Only framing failures end the
/// stream.
#[derive(Debug, Default)]
pub struct EventCodec {
    inner: LineCodec,
}

impl EventCodec {
    /// Codec with the default line cap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec with a custom line cap.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            inner: LineCodec::with_max_len(max_len),
        }
    }
}

impl Decoder for EventCodec {
    type Item = std::result::Result<Event, ParseError>;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        Ok(self.inner.decode(src)?.map(|line| line.parse::<Event>()))
    }
}

impl Encoder<Event> for EventCodec {
    type Error = ProtocolError;

    fn encode(&mut self, event: Event, dst: &mut BytesMut) -> Result<()> {
        self.inner.encode(event.encode(), dst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_lines_do_not_end_the_stream() {
        let mut codec = EventCodec::new();
        let mut buf = BytesMut::from("   \r\n:srv 001 quarid :hi\r\n");
        assert_eq!(
            codec.decode(&mut buf).unwrap(),
            Some(Err(ParseError::EmptyLine))
        );
        let ev = codec.decode(&mut buf).unwrap().unwrap().unwrap();
        assert_eq!(ev.command, "001");
    }

    #[test]
    fn encodes_one_crlf_line() {
        let mut codec = EventCodec::new();
        let mut dst = BytesMut::new();
        codec
            .encode(Event::privmsg("#c", "hello world"), &mut dst)
            .unwrap();
        assert_eq!(&dst[..], b"PRIVMSG #c :hello world\r\n");
    }
}
