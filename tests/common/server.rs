//! Scripted IRC server.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpListener;
use tokio::time::timeout;

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

pub struct MockServer {
    listener: TcpListener,
}

impl MockServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        Self { listener }
    }

    pub fn addr(&self) -> SocketAddr {
        self.listener.local_addr().unwrap()
    }

    /// Accept the bot's connection.
    pub async fn accept(&self) -> Peer {
        let (socket, _) = timeout(RECV_TIMEOUT, self.listener.accept())
            .await
            .expect("bot connects")
            .unwrap();
        let (read, write) = socket.into_split();
        Peer {
            lines: BufReader::new(read).lines(),
            writer: write,
        }
    }
}

/// The server's end of one bot connection.
pub struct Peer {
    lines: Lines<BufReader<OwnedReadHalf>>,
    writer: OwnedWriteHalf,
}

#[allow(dead_code)]
impl Peer {
    pub async fn send(&mut self, line: &str) {
        self.writer.write_all(line.as_bytes()).await.unwrap();
        self.writer.write_all(b"\r\n").await.unwrap();
        self.writer.flush().await.unwrap();
    }

    /// Next line from the bot, CRLF stripped. Panics after a timeout.
    pub async fn recv(&mut self) -> String {
        timeout(RECV_TIMEOUT, self.lines.next_line())
            .await
            .expect("line from bot")
            .unwrap()
            .expect("bot closed the connection")
    }

    /// Next line from the bot, or `None` if it closes or stays quiet for
    /// `wait`.
    pub async fn try_recv(&mut self, wait: Duration) -> Option<String> {
        match timeout(wait, self.lines.next_line()).await {
            Ok(Ok(line)) => line,
            _ => None,
        }
    }

    /// Skip lines until one satisfies `pred`; returns it.
    pub async fn recv_until<F: Fn(&str) -> bool>(&mut self, pred: F) -> String {
        loop {
            let line = self.recv().await;
            if pred(&line) {
                return line;
            }
        }
    }

    /// Read NICK and USER, then welcome the bot as `nick`.
    pub async fn welcome(&mut self, nick: &str) {
        assert_eq!(self.recv().await, format!("NICK {nick}"));
        assert!(self.recv().await.starts_with("USER "));
        self.send(&format!(":irc.test 001 {nick} :Welcome to the test network"))
            .await;
    }

    /// Read until the bot closes the connection; returns what it sent.
    pub async fn drain(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        while let Some(line) = self.try_recv(RECV_TIMEOUT).await {
            out.push(line);
        }
        out
    }
}
