//! Plain or TLS client streams, split into owned halves.
//!
//! The connection runs its reader and writer as separate tasks, so the
//! stream is split once after the handshake and each half is wrapped in
//! its own `FramedRead`/`FramedWrite`.

use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;

/// An established client stream.
pub enum TransportStream {
    /// Plain TCP.
    Tcp(TcpStream),
    /// TLS over TCP (boxed for size).
    ClientTls(Box<TlsStream<TcpStream>>),
}

impl TransportStream {
    /// Split into independently owned read and write halves.
    pub fn split(self) -> (TransportReadHalf, TransportWriteHalf) {
        match self {
            Self::Tcp(stream) => {
                let (r, w) = stream.into_split();
                (TransportReadHalf::Tcp(r), TransportWriteHalf::Tcp(w))
            }
            Self::ClientTls(stream) => {
                let (r, w) = tokio::io::split(*stream);
                (
                    TransportReadHalf::ClientTls(r),
                    TransportWriteHalf::ClientTls(w),
                )
            }
        }
    }

    /// True for the TLS variant.
    pub fn is_tls(&self) -> bool {
        matches!(self, Self::ClientTls(_))
    }
}

/// Owned read half.
pub enum TransportReadHalf {
    /// TCP read half.
    Tcp(tokio::net::tcp::OwnedReadHalf),
    /// TLS read half.
    ClientTls(tokio::io::ReadHalf<TlsStream<TcpStream>>),
}

/// Owned write half.
pub enum TransportWriteHalf {
    /// TCP write half.
    Tcp(tokio::net::tcp::OwnedWriteHalf),
    /// TLS write half.
    ClientTls(tokio::io::WriteHalf<TlsStream<TcpStream>>),
}

impl AsyncRead for TransportReadHalf {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_read(cx, buf),
            Self::ClientTls(inner) => Pin::new(inner).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for TransportWriteHalf {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_write(cx, buf),
            Self::ClientTls(inner) => Pin::new(inner).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_flush(cx),
            Self::ClientTls(inner) => Pin::new(inner).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Self::Tcp(inner) => Pin::new(inner).poll_shutdown(cx),
            Self::ClientTls(inner) => Pin::new(inner).poll_shutdown(cx),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn tcp_halves_carry_bytes_both_ways() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 5];
            sock.read_exact(&mut buf).await.unwrap();
            sock.write_all(b"pong!").await.unwrap();
            buf
        });

        let stream = TransportStream::Tcp(TcpStream::connect(addr).await.unwrap());
        assert!(!stream.is_tls());
        let (mut rd, mut wr) = stream.split();
        wr.write_all(b"ping!").await.unwrap();
        let mut reply = [0u8; 5];
        rd.read_exact(&mut reply).await.unwrap();

        assert_eq!(&reply, b"pong!");
        assert_eq!(&server.await.unwrap(), b"ping!");
    }
}
