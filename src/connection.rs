// ── Hubchat: Connection Manager ────────────────────────────────────────────
// Owns exactly one logical duplex WebSocket connection to the hub endpoint.
//
// Lifecycle: `start` performs the initial connect inline, so a handshake
// failure is the caller's error and is NOT retried. Once a connection has
// been established, a supervisor task takes over the read half; when the
// transport drops it reconnects with jittered exponential backoff,
// indefinitely, until it succeeds or `stop` is called. The registered
// receive handler keeps firing across reconnects without re-registration:
// the supervisor dispatches into the same handler slot no matter how many
// times the underlying socket is replaced.
//
// `stop` is terminal and idempotent. Send failures surface to the caller
// and never tear down the session.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::backoff;
use crate::error::{ChatError, ChatResult};
use crate::wire::ChatEvent;

type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, WsMessage>;
type WsSource = SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>;

/// Callback invoked once per inbound `(sender, text)` event.
pub type ReceiveHandler = Box<dyn Fn(String, String) + Send + Sync + 'static>;

// ── Connection state ───────────────────────────────────────────────────────

/// Reified connection lifecycle. `Stopped` is terminal; every other state
/// can reach it via `stop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Reconnecting,
    Stopped,
}

// ── Shared innards ─────────────────────────────────────────────────────────

struct Shared {
    url: String,
    state: parking_lot::Mutex<ConnectionState>,
    /// Write half of the active socket; `None` whenever no transport is up.
    /// Tokio mutex because sends hold the guard across an await.
    sink: tokio::sync::Mutex<Option<WsSink>>,
    /// Single persistent receive handler slot, re-armed implicitly on
    /// reconnect because the supervisor always dispatches through it.
    handler: parking_lot::Mutex<Option<ReceiveHandler>>,
    stop: AtomicBool,
}

impl Shared {
    fn set_state(&self, next: ConnectionState) {
        *self.state.lock() = next;
    }

    fn stopping(&self) -> bool {
        self.stop.load(Ordering::Relaxed)
    }
}

// ── Connection ─────────────────────────────────────────────────────────────

pub struct Connection {
    shared: Arc<Shared>,
    supervisor: parking_lot::Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl Connection {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            shared: Arc::new(Shared {
                url: url.into(),
                state: parking_lot::Mutex::new(ConnectionState::Disconnected),
                sink: tokio::sync::Mutex::new(None),
                handler: parking_lot::Mutex::new(None),
                stop: AtomicBool::new(false),
            }),
            supervisor: parking_lot::Mutex::new(None),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }

    /// Register the receive callback. One slot: registering again replaces
    /// the previous handler. Survives reconnects.
    pub fn on_receive<F>(&self, handler: F)
    where
        F: Fn(String, String) + Send + Sync + 'static,
    {
        *self.shared.handler.lock() = Some(Box::new(handler));
    }

    /// Connect to the hub. On success the supervisor task owns the socket
    /// from here on. On failure the state returns to `Disconnected` and no
    /// retry is attempted; retrying is the caller's decision.
    pub async fn start(&self) -> ChatResult<()> {
        {
            let mut state = self.shared.state.lock();
            match *state {
                ConnectionState::Stopped => return Err(ChatError::Terminated),
                ConnectionState::Disconnected => *state = ConnectionState::Connecting,
                _ => return Err("connection already started".into()),
            }
        }

        info!("[connection] Connecting to {}", self.shared.url);
        match connect_async(&self.shared.url).await {
            Ok((ws, _)) => {
                let (write, read) = ws.split();
                *self.shared.sink.lock().await = Some(write);
                self.shared.set_state(ConnectionState::Connected);
                info!("[connection] Connected");

                let shared = self.shared.clone();
                *self.supervisor.lock() = Some(tokio::spawn(supervise(shared, read)));
                Ok(())
            }
            Err(e) => {
                self.shared.set_state(ConnectionState::Disconnected);
                Err(ChatError::connect(&self.shared.url, e.to_string()))
            }
        }
    }

    /// Transmit one `(sender, text)` event. Fails with `NotConnected` when
    /// no transport is up; a later attempt may succeed once reconnected.
    pub async fn send(&self, sender: &str, text: &str) -> ChatResult<()> {
        if self.state() == ConnectionState::Stopped {
            return Err(ChatError::Terminated);
        }
        let frame = ChatEvent::new(sender, text).encode_outbound();
        let mut guard = self.shared.sink.lock().await;
        let sink = guard.as_mut().ok_or(ChatError::NotConnected)?;
        sink.send(WsMessage::Text(frame)).await?;
        Ok(())
    }

    /// End the connection's lifecycle. Terminal and idempotent: a second
    /// call is a no-op. Close-frame delivery is best-effort.
    pub async fn stop(&self) {
        if self.state() == ConnectionState::Stopped {
            debug!("[connection] Already stopped");
            return;
        }
        self.shared.stop.store(true, Ordering::Relaxed);

        let mut guard = self.shared.sink.lock().await;
        if let Some(sink) = guard.as_mut() {
            if let Err(e) = sink.close().await {
                warn!("[connection] Error while closing: {}", e);
            }
        }
        *guard = None;
        drop(guard);

        if let Some(task) = self.supervisor.lock().take() {
            task.abort();
        }
        self.shared.set_state(ConnectionState::Stopped);
        info!("[connection] Stopped");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // The supervisor holds no reference back to `Connection`, only to
        // `Shared`; abort it so a dropped-without-stop connection does not
        // leave a reconnect loop running.
        if let Some(task) = self.supervisor.lock().take() {
            task.abort();
        }
    }
}

// ── Supervisor ─────────────────────────────────────────────────────────────

/// Owns the read half. Pumps inbound frames into the handler slot; on
/// transport drop, swaps in a fresh socket via the reconnect loop and keeps
/// pumping. Exits when `stop` is flagged.
async fn supervise(shared: Arc<Shared>, mut read: WsSource) {
    loop {
        pump(&shared, &mut read).await;
        *shared.sink.lock().await = None;
        if shared.stopping() {
            break;
        }

        shared.set_state(ConnectionState::Reconnecting);
        warn!("[connection] Transport dropped, reconnecting to {}", shared.url);

        let mut attempt: u32 = 0;
        let ws = loop {
            if shared.stopping() {
                return;
            }
            let delay = backoff::reconnect_delay(attempt).await;
            attempt += 1;
            if shared.stopping() {
                return;
            }
            debug!(
                "[connection] Reconnect attempt {} after {}ms",
                attempt,
                delay.as_millis()
            );
            match connect_async(&shared.url).await {
                Ok((ws, _)) => break ws,
                Err(e) => warn!("[connection] Reconnect attempt {} failed: {}", attempt, e),
            }
        };

        let (write, next_read) = ws.split();
        *shared.sink.lock().await = Some(write);
        shared.set_state(ConnectionState::Connected);
        info!("[connection] Reconnected after {} attempt(s)", attempt);
        read = next_read;
    }
}

/// Read frames until the transport drops. Inbound events are dispatched in
/// transport delivery order; frames that fail to decode are skipped.
async fn pump(shared: &Arc<Shared>, read: &mut WsSource) {
    while let Some(item) = read.next().await {
        let msg = match item {
            Ok(m) => m,
            Err(e) => {
                warn!("[connection] Read error: {}", e);
                return;
            }
        };

        match msg {
            WsMessage::Text(raw) => {
                let Some(event) = ChatEvent::decode_inbound(&raw) else {
                    debug!("[connection] Skipping unparseable frame");
                    continue;
                };
                let handler = shared.handler.lock();
                if let Some(h) = handler.as_ref() {
                    h(event.sender, event.text);
                }
            }
            WsMessage::Ping(data) => {
                if let Some(sink) = shared.sink.lock().await.as_mut() {
                    let _ = sink.send(WsMessage::Pong(data)).await;
                }
            }
            WsMessage::Close(_) => {
                info!("[connection] Close frame received");
                return;
            }
            _ => {}
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
