//! The single persistent connection to the desktop bridge.
//!
//! [`ConnectionManager`] owns the WebSocket, the [`ConnectionState`], and two
//! background tasks per live connection:
//!
//! - a reader that decodes every inbound frame and hands it to the
//!   [`DispatchRegistry`], dropping (and logging) frames that fail to decode
//! - a writer that drains the outbound queue in the order `send` was called
//!
//! Connection loss moves the state to `Disconnected`. There is no automatic
//! reconnect and nothing queued for a dead connection is retransmitted;
//! observers of [`ConnectionManager::watch_state`] decide what to do.

mod state;

pub use state::ConnectionState;

use crate::dispatch::DispatchRegistry;
use crate::envelope::decode;
use crate::error::connection::ConnectionError;

use common::ErrorLocation;

use std::panic::Location;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use url::Url;

type BridgeStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// How long `close()` waits for the close frame to be written.
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(2);

/// Owner of the bridge connection.
///
/// Cheap to clone; all clones share one connection and one state.
#[derive(Clone)]
pub struct ConnectionManager {
    shared: Arc<Shared>,
}

struct Shared {
    url: Url,
    connect_timeout: Duration,
    state: watch::Sender<ConnectionState>,
    link: Mutex<Option<Link>>,
    next_generation: AtomicU64,
    registry: DispatchRegistry,
}

/// Handles for one live connection. A new `connect()` gets a new generation so
/// that late loss reports from an old connection are ignored.
struct Link {
    generation: u64,
    outbound: mpsc::UnboundedSender<Message>,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl Link {
    fn abort(self) {
        self.reader.abort();
        self.writer.abort();
    }
}

impl ConnectionManager {
    pub fn new(url: Url, connect_timeout: Duration, registry: DispatchRegistry) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);

        Self {
            shared: Arc::new(Shared {
                url,
                connect_timeout,
                state,
                link: Mutex::new(None),
                next_generation: AtomicU64::new(0),
                registry,
            }),
        }
    }

    pub fn url(&self) -> &Url {
        &self.shared.url
    }

    pub fn state(&self) -> ConnectionState {
        *self.shared.state.borrow()
    }

    /// Receiver that observes every state transition.
    pub fn watch_state(&self) -> watch::Receiver<ConnectionState> {
        self.shared.state.subscribe()
    }

    /// Establish the connection.
    ///
    /// Returns at once if already `Open`; joins the in-flight attempt if
    /// `Connecting`. Otherwise dials the bridge and, on success, starts the
    /// reader and writer tasks.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::EstablishFailed`] if the WebSocket handshake
    /// fails or times out. The state is back to `Disconnected` afterwards.
    pub async fn connect(&self) -> Result<(), ConnectionError> {
        let mut claimed = false;
        self.shared.state.send_if_modified(|state| {
            if state.can_dial() {
                *state = ConnectionState::Connecting;
                claimed = true;
                true
            } else {
                false
            }
        });

        if !claimed {
            return self.await_attempt().await;
        }

        info!("Connecting to desktop bridge at {}", self.shared.url);

        let attempt = timeout(
            self.shared.connect_timeout,
            connect_async(self.shared.url.as_str()),
        )
        .await;

        let stream = match attempt {
            Ok(Ok((stream, _response))) => stream,
            Ok(Err(e)) => {
                return Err(self.fail_attempt(format!(
                    "WebSocket connect to {} failed: {e}",
                    self.shared.url
                )));
            }
            Err(_) => {
                return Err(self.fail_attempt(format!(
                    "WebSocket connect to {} timed out after {:?}",
                    self.shared.url, self.shared.connect_timeout
                )));
            }
        };

        self.attach(stream)
    }

    /// Queue a text frame for the writer task.
    ///
    /// Never suspends. Frames sent while the connection is not `Open` are lost.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectionError::NotOpen`] unless the state is `Open`.
    #[track_caller]
    pub fn send(&self, frame: String) -> Result<(), ConnectionError> {
        let location = ErrorLocation::from(Location::caller());
        let guard = self.shared.lock_link();
        let state = *self.shared.state.borrow();

        match guard.as_ref() {
            Some(link) if state.is_open() => link
                .outbound
                .send(Message::Text(frame.into()))
                .map_err(|_| ConnectionError::NotOpen { state, location }),
            _ => Err(ConnectionError::NotOpen { state, location }),
        }
    }

    /// Close the connection on purpose. The state becomes `Closed`.
    pub async fn close(&self) {
        let link = {
            let mut guard = self.shared.lock_link();
            self.shared.state.send_replace(ConnectionState::Closed);
            guard.take()
        };

        let Some(Link {
            outbound,
            reader,
            mut writer,
            ..
        }) = link
        else {
            info!("Close requested with no live connection");
            return;
        };

        reader.abort();

        if outbound.send(Message::Close(None)).is_ok() {
            drop(outbound);
            if timeout(CLOSE_FLUSH_TIMEOUT, &mut writer).await.is_err() {
                warn!("Timed out flushing close frame to desktop bridge");
                writer.abort();
            }
        } else {
            writer.abort();
        }

        info!("Connection to desktop bridge closed");
    }

    /// Decode one raw frame and deliver it, as the reader task does.
    #[cfg(test)]
    pub(crate) fn ingest(&self, bytes: &[u8]) {
        self.shared.ingest(bytes);
    }

    /// Mark the connection `Open` behind a link whose writer already exited.
    #[cfg(test)]
    pub(crate) fn open_with_dead_writer(&self) {
        let (outbound, inbound) = mpsc::unbounded_channel();
        drop(inbound);

        let generation = self.shared.next_generation.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.shared.lock_link();
        *guard = Some(Link {
            generation,
            outbound,
            reader: tokio::spawn(async {}),
            writer: tokio::spawn(async {}),
        });
        self.shared.state.send_replace(ConnectionState::Open);
    }

    async fn await_attempt(&self) -> Result<(), ConnectionError> {
        let mut states = self.shared.state.subscribe();
        let settled = states
            .wait_for(|state| *state != ConnectionState::Connecting)
            .await
            .map(|state| *state);

        match settled {
            Ok(ConnectionState::Open) => Ok(()),
            Ok(other) => Err(ConnectionError::EstablishFailed {
                message: format!("Concurrent connection attempt ended {other}"),
                location: ErrorLocation::from(Location::caller()),
            }),
            Err(e) => Err(ConnectionError::EstablishFailed {
                message: format!("Connection state channel closed: {e}"),
                location: ErrorLocation::from(Location::caller()),
            }),
        }
    }

    #[track_caller]
    fn fail_attempt(&self, message: String) -> ConnectionError {
        warn!("{message}");

        // close() may have moved us to Closed meanwhile; keep that.
        self.shared.state.send_if_modified(|state| {
            if *state == ConnectionState::Connecting {
                *state = ConnectionState::Disconnected;
                true
            } else {
                false
            }
        });

        ConnectionError::EstablishFailed {
            message,
            location: ErrorLocation::from(Location::caller()),
        }
    }

    #[track_caller]
    fn attach(&self, stream: BridgeStream) -> Result<(), ConnectionError> {
        let mut guard = self.shared.lock_link();

        if *self.shared.state.borrow() != ConnectionState::Connecting {
            return Err(ConnectionError::EstablishFailed {
                message: String::from("Connection was closed while the handshake was in flight"),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        let generation = self.shared.next_generation.fetch_add(1, Ordering::SeqCst);
        let (sink, source) = stream.split();
        let (outbound, queue) = mpsc::unbounded_channel();

        let writer = tokio::spawn(write_loop(
            Arc::clone(&self.shared),
            generation,
            sink,
            queue,
        ));
        let reader = tokio::spawn(read_loop(Arc::clone(&self.shared), generation, source));

        let stale = guard.replace(Link {
            generation,
            outbound,
            reader,
            writer,
        });
        if let Some(stale) = stale {
            stale.abort();
        }

        self.shared.state.send_replace(ConnectionState::Open);
        info!("Connected to desktop bridge at {}", self.shared.url);

        Ok(())
    }
}

impl Shared {
    fn lock_link(&self) -> MutexGuard<'_, Option<Link>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn ingest(&self, bytes: &[u8]) {
        match decode(bytes) {
            Ok(envelope) => {
                debug!("Received {} from desktop bridge", envelope.discriminant());
                self.registry.deliver(envelope);
            }
            Err(e) => warn!("Dropping inbound frame: {e}"),
        }
    }

    /// Record that connection `generation` died. Ignored if it is no longer
    /// the live connection (replaced, or closed on purpose).
    fn mark_lost(&self, generation: u64, reason: &str) {
        let mut guard = self.lock_link();

        if guard.as_ref().map(|link| link.generation) != Some(generation) {
            return;
        }

        if let Some(link) = guard.take() {
            link.reader.abort();
        }

        self.state.send_replace(ConnectionState::Disconnected);
        warn!("Lost connection to desktop bridge: {reason}");
    }
}

async fn read_loop(shared: Arc<Shared>, generation: u64, mut source: SplitStream<BridgeStream>) {
    let reason = loop {
        match source.next().await {
            Some(Ok(Message::Text(text))) => shared.ingest(text.as_bytes()),
            Some(Ok(Message::Binary(data))) => shared.ingest(&data),
            Some(Ok(Message::Close(frame))) => break format!("closed by peer ({frame:?})"),
            // Ping/pong replies are handled by tungstenite.
            Some(Ok(_)) => {}
            Some(Err(e)) => break format!("read failed: {e}"),
            None => break String::from("stream ended"),
        }
    };

    shared.mark_lost(generation, &reason);
}

async fn write_loop(
    shared: Arc<Shared>,
    generation: u64,
    mut sink: SplitSink<BridgeStream, Message>,
    mut queue: mpsc::UnboundedReceiver<Message>,
) {
    while let Some(frame) = queue.recv().await {
        let closing = matches!(frame, Message::Close(_));

        if let Err(e) = sink.send(frame).await {
            shared.mark_lost(generation, &format!("write failed: {e}"));
            return;
        }

        if closing {
            return;
        }
    }
}
