//! Client connection driver.
//!
//! A [`Connection`] owns one link to the server at a time. The stream is
//! split after the dial: a reader task decodes events, feeds them to the
//! [`Handshake`] state machine, and fans them out through the
//! [`Dispatcher`]; a writer task drains the outbound queue that every
//! [`Responder`] feeds. Either task ending tears the link down.

mod responder;
mod tls;

pub use responder::Responder;
pub use tls::upgrade_to_tls;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use quarid_proto::nick::COLLISION_SUFFIX_LEN;
use quarid_proto::{
    ConnectionState, Event, EventCodec, Handshake, HandshakeAction, HandshakeConfig,
    TransportReadHalf, TransportStream, TransportWriteHalf,
};
use rand::Rng;
use rand::distributions::Alphanumeric;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::config::IrcConfig;
use crate::dispatch::Dispatcher;
use crate::error::ConnectionError;

/// Outbound events buffered before handlers start waiting on the writer.
const OUTBOUND_QUEUE: usize = 256;

/// Upper bound on flushing the QUIT line during a disconnect.
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Where and how to connect.
#[derive(Clone, Debug)]
pub struct ConnectionConfig {
    /// `host:port`
    pub server: String,
    /// TLS server name.
    pub host: String,
    pub tls: bool,
    pub verify_cert: bool,
    pub connect_timeout: Duration,
    pub handshake: HandshakeConfig,
}

impl ConnectionConfig {
    pub fn from_irc(irc: &IrcConfig) -> Self {
        let mut handshake = HandshakeConfig::new(&irc.nick, irc.ident(), &irc.realname);
        handshake.nick_retry_limit = irc.nick_retry_limit;
        Self {
            server: irc.server.clone(),
            host: irc.host().to_string(),
            tls: irc.tls.enabled,
            verify_cert: irc.tls.verify,
            connect_timeout: irc.connect_timeout(),
            handshake,
        }
    }
}

/// One live link: its writer queue, its cancellation token, its writer task.
struct Link {
    id: u64,
    responder: Responder,
    cancel: CancellationToken,
    writer: Option<JoinHandle<()>>,
}

struct Shared {
    handshake: Mutex<Handshake>,
    state: watch::Sender<ConnectionState>,
    link: Mutex<Option<Link>>,
    next_id: AtomicU64,
}

impl Shared {
    fn publish(&self) {
        let state = self.handshake.lock().state();
        self.state.send_replace(state);
    }

    /// Feed `event` to the handshake on behalf of link `id`. Returns `None`
    /// when `id` is no longer the current link.
    fn feed(&self, id: u64, event: &Event) -> Option<Vec<HandshakeAction>> {
        let slot = self.link.lock();
        if !slot.as_ref().is_some_and(|l| l.id == id && !l.cancel.is_cancelled()) {
            return None;
        }
        Some(self.handshake.lock().feed(event, random_suffix))
    }

    /// Publish the state unless link `id` has been replaced.
    fn publish_for(&self, id: u64) {
        let slot = self.link.lock();
        if slot.as_ref().is_some_and(|l| l.id == id) {
            self.publish();
        }
    }

    /// Drop link `id` if it is still the current one.
    fn teardown(&self, id: u64) {
        let link = {
            let mut slot = self.link.lock();
            if slot.as_ref().is_some_and(|l| l.id == id) {
                slot.take()
            } else {
                None
            }
        };
        if let Some(link) = link {
            link.cancel.cancel();
            self.handshake.lock().disconnected();
            self.publish();
            info!("Disconnected");
        }
    }
}

pub struct Connection {
    config: ConnectionConfig,
    dispatcher: Arc<Dispatcher>,
    shared: Arc<Shared>,
}

impl Connection {
    pub fn new(config: ConnectionConfig, dispatcher: Arc<Dispatcher>) -> Self {
        let handshake = Handshake::new(config.handshake.clone());
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            config,
            dispatcher,
            shared: Arc::new(Shared {
                handshake: Mutex::new(handshake),
                state,
                link: Mutex::new(None),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.shared.handshake.lock().state()
    }

    /// Nick currently claimed on the server.
    pub fn nick(&self) -> String {
        self.shared.handshake.lock().nick().to_string()
    }

    /// Writer handle for the current link, if any.
    pub fn responder(&self) -> Option<Responder> {
        self.shared.link.lock().as_ref().map(|l| l.responder.clone())
    }

    /// Dial, start the reader and writer tasks, and send NICK/USER.
    ///
    /// Returns once registration has been sent; the welcome arrives later
    /// through the reader. Watch [`state`](Self::state) or register a
    /// handler for `001` to act on it.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        {
            let mut hs = self.shared.handshake.lock();
            if hs.state() != ConnectionState::Disconnected {
                return Err(ConnectionError::AlreadyConnected);
            }
            hs.connecting();
        }
        self.shared.publish();
        info!(server = %self.config.server, tls = self.config.tls, "Connecting");

        let stream = match tokio::time::timeout(self.config.connect_timeout, self.dial()).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                self.abort_dial();
                return Err(e);
            }
            Err(_) => {
                self.abort_dial();
                return Err(ConnectionError::Timeout(self.config.connect_timeout));
            }
        };
        info!(server = %self.config.server, tls = stream.is_tls(), "Connected");

        let (read, write) = stream.split();
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE);
        let responder = Responder::new(tx);
        let cancel = CancellationToken::new();
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);

        let writer = tokio::spawn(write_loop(
            FramedWrite::new(write, EventCodec::new()),
            rx,
            cancel.clone(),
        ));
        *self.shared.link.lock() = Some(Link {
            id,
            responder: responder.clone(),
            cancel: cancel.clone(),
            writer: Some(writer),
        });

        let actions = self.shared.handshake.lock().start();
        self.shared.publish();
        apply(actions, &responder).await;

        tokio::spawn(read_loop(
            FramedRead::new(read, EventCodec::new()),
            id,
            Arc::clone(&self.shared),
            Arc::clone(&self.dispatcher),
            responder,
            cancel,
        ));
        Ok(())
    }

    /// Send QUIT (best effort) and close the link. Safe to call at any
    /// time and any number of times.
    pub async fn disconnect(&self, reason: &str) {
        let Some(mut link) = self.shared.link.lock().take() else {
            return;
        };

        match tokio::time::timeout(FLUSH_TIMEOUT, link.responder.write(Event::quit(reason))).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => debug!(error = %e, "QUIT not sent"),
            Err(_) => debug!("QUIT not sent: writer stalled"),
        }
        link.cancel.cancel();
        if let Some(writer) = link.writer.take()
            && tokio::time::timeout(FLUSH_TIMEOUT, writer).await.is_err()
        {
            warn!("Writer did not finish flushing");
        }

        self.shared.handshake.lock().disconnected();
        self.shared.publish();
        info!(reason = %reason, "Disconnected");
    }

    /// Resolve once the connection is `Disconnected`, immediately if it
    /// already is.
    pub async fn wait(&self) {
        let mut rx = self.shared.state.subscribe();
        let _ = rx
            .wait_for(|state| *state == ConnectionState::Disconnected)
            .await;
    }

    async fn dial(&self) -> Result<TransportStream, ConnectionError> {
        let tcp = TcpStream::connect(&self.config.server).await?;
        tcp.set_nodelay(true)?;
        if !self.config.tls {
            return Ok(TransportStream::Tcp(tcp));
        }
        let tls = upgrade_to_tls(tcp, &self.config.host, self.config.verify_cert).await?;
        Ok(TransportStream::ClientTls(Box::new(tls)))
    }

    fn abort_dial(&self) {
        self.shared.handshake.lock().disconnected();
        self.shared.publish();
    }
}

fn random_suffix() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(COLLISION_SUFFIX_LEN)
        .map(char::from)
        .collect()
}

/// Carry out handshake actions. Returns the reason when the link must close.
async fn apply(actions: Vec<HandshakeAction>, responder: &Responder) -> Option<String> {
    for action in actions {
        match action {
            HandshakeAction::Send(event) => {
                if let Err(e) = responder.write(event).await {
                    debug!(error = %e, "Handshake write dropped");
                }
            }
            HandshakeAction::NickChanged { from, to } => {
                info!(from = %from, to = %to, "Nickname changed");
            }
            HandshakeAction::Registered { nick } => {
                info!(nick = %nick, "Registered with server");
            }
            HandshakeAction::Terminate(reason) => return Some(reason),
        }
    }
    None
}

async fn read_loop(
    mut frames: FramedRead<TransportReadHalf, EventCodec>,
    id: u64,
    shared: Arc<Shared>,
    dispatcher: Arc<Dispatcher>,
    responder: Responder,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => break,
            frame = frames.next() => frame,
        };
        let event = match frame {
            Some(Ok(Ok(event))) => event,
            Some(Ok(Err(e))) => {
                debug!(error = %e, "Dropping malformed line");
                continue;
            }
            Some(Err(e)) => {
                warn!(error = %e, "Read failed");
                break;
            }
            None => {
                info!("Server closed the connection");
                break;
            }
        };
        trace!(line = %event, "<<");

        let Some(actions) = shared.feed(id, &event) else {
            debug!(link = id, "Link replaced; reader stopping");
            break;
        };
        let terminate = apply(actions, &responder).await;

        dispatcher.dispatch(Arc::new(event), &responder);

        if let Some(reason) = terminate {
            warn!(reason = %reason, "Link terminated");
            break;
        }
        // Disconnected is published by teardown, after the link is dropped.
        shared.publish_for(id);
    }
    shared.teardown(id);
}

async fn write_loop(
    mut sink: FramedWrite<TransportWriteHalf, EventCodec>,
    mut rx: mpsc::Receiver<Event>,
    cancel: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = rx.recv() => match event {
                Some(event) => {
                    trace!(line = %event, ">>");
                    if let Err(e) = sink.send(event).await {
                        warn!(error = %e, "Write failed");
                        cancel.cancel();
                        return;
                    }
                }
                None => break,
            },
            _ = cancel.cancelled() => break,
        }
    }
    while let Ok(event) = rx.try_recv() {
        trace!(line = %event, ">>");
        if sink.send(event).await.is_err() {
            break;
        }
    }
    let _ = sink.close().await;
}
