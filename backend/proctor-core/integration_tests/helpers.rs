//! Test helpers for the bus integration tests.
//!
//! A [`TestBridge`] is a loopback WebSocket server standing in for the
//! desktop bridge process. Each accepted connection is handed to the test
//! so it can push frames and inspect what the client wrote.

use proctor_core::bus::Bus;
use proctor_core::config::{BusConfig, ServerConfig};
use proctor_core::connection::ConnectionState;
use proctor_core::shell::{Notifier, Toast};

use std::sync::Mutex;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{WebSocketStream, accept_async};

pub type BridgeSide = WebSocketStream<TcpStream>;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

pub struct TestBridge {
    listener: TcpListener,
    pub url: String,
}

impl TestBridge {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test bridge");
        let port = listener.local_addr().expect("No local address").port();

        Self {
            listener,
            url: format!("ws://127.0.0.1:{port}/ws"),
        }
    }

    /// Accept one client and complete the WebSocket handshake.
    pub async fn accept(&self) -> BridgeSide {
        let (stream, _) = timeout(WAIT, self.listener.accept())
            .await
            .expect("Timed out waiting for client")
            .expect("Failed to accept client");
        accept_async(stream)
            .await
            .expect("WebSocket handshake failed")
    }
}

pub fn bus_for(url: &str) -> Bus {
    let config = BusConfig {
        server: ServerConfig {
            bridge_url: url.to_string(),
            connect_timeout_secs: 5,
            ..ServerConfig::default()
        },
        ..BusConfig::default()
    };
    Bus::new(&config).expect("Failed to build bus")
}

/// Connect `bus` to `bridge`, returning the bridge's side of the connection.
pub async fn connect(bus: &Bus, bridge: &TestBridge) -> BridgeSide {
    let (connected, side) = tokio::join!(bus.connect(), bridge.accept());
    connected.expect("Bus failed to connect");
    side
}

pub async fn push_text(side: &mut BridgeSide, frame: &str) {
    side.send(Message::Text(frame.to_string().into()))
        .await
        .expect("Failed to push frame");
}

/// Next text frame the client wrote, parsed as JSON.
pub async fn receive_json(side: &mut BridgeSide) -> Value {
    let message = timeout(WAIT, side.next())
        .await
        .expect("Timed out waiting for frame")
        .expect("Client closed the stream")
        .expect("Error receiving frame");

    match message {
        Message::Text(text) => serde_json::from_str(text.as_str()).expect("Frame is not JSON"),
        other => panic!("Expected text frame, got {other:?}"),
    }
}

pub async fn wait_for_state(bus: &Bus, expected: ConnectionState) {
    let mut states = bus.watch_state();
    timeout(WAIT, states.wait_for(|state| *state == expected))
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for state {expected}"))
        .expect("State channel closed");
}

#[derive(Default)]
pub struct RecordingNotifier {
    toasts: Mutex<Vec<Toast>>,
}

impl RecordingNotifier {
    pub fn toasts(&self) -> Vec<Toast> {
        self.toasts.lock().unwrap().clone()
    }

    /// Wait until at least `count` toasts were shown.
    pub async fn wait_for_toasts(&self, count: usize) -> Vec<Toast> {
        timeout(WAIT, async {
            loop {
                let toasts = self.toasts();
                if toasts.len() >= count {
                    return toasts;
                }
                sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("Timed out waiting for {count} toasts"))
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, toast: Toast) {
        self.toasts.lock().unwrap().push(toast);
    }
}
