//! Outbound handle given to handlers.

use quarid_proto::Event;
use tokio::sync::mpsc;

use crate::error::ConnectionError;

/// Cloneable sender into the connection's writer task.
///
/// Every handler writes through one of these, so lines from concurrent
/// handlers are serialized by the writer and never interleave.
#[derive(Clone, Debug)]
pub struct Responder {
    tx: mpsc::Sender<Event>,
}

impl Responder {
    pub fn new(tx: mpsc::Sender<Event>) -> Self {
        Self { tx }
    }

    /// Queue one event. Fails with `Closed` once the writer is gone.
    pub async fn write(&self, event: Event) -> Result<(), ConnectionError> {
        self.tx.send(event).await.map_err(|_| ConnectionError::Closed)
    }

    pub async fn privmsg(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.write(Event::privmsg(target, text)).await
    }

    /// CTCP ACTION (`/me`).
    pub async fn action(&self, target: &str, text: &str) -> Result<(), ConnectionError> {
        self.write(Event::action(target, text)).await
    }

    pub async fn mode(&self, channel: &str, mode: &str, arg: &str) -> Result<(), ConnectionError> {
        self.write(Event::mode(channel, mode, arg)).await
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
