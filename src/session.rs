// ── Hubchat: Chat Session Controller ───────────────────────────────────────
// Composes identity, history, connection, and the scroll anchor into one
// activation-to-teardown lifetime:
//
//   Activation: capture username, load the persisted snapshot, start the
//               connection, wire the receive handler.
//   Steady:     `send_message` consumes the input buffer; inbound events
//               from other senders append to history; both request a
//               scroll.
//   Teardown:   snapshot the history, stop the connection best-effort.
//
// After `close` the session is terminated; re-activation means building a
// fresh `ChatSession` (new load, new connection).

use std::sync::Arc;
use std::time::Duration;

use log::{error, info};
use parking_lot::Mutex;

use crate::config::HubConfig;
use crate::connection::{Connection, ConnectionState};
use crate::error::{ChatError, ChatResult};
use crate::history::{ChatMessage, HistoryStore};
use crate::scroll::ScrollAnchor;

pub struct ChatSession {
    username: String,
    input: String,
    history: Arc<Mutex<Vec<ChatMessage>>>,
    connection: Connection,
    store: Arc<dyn HistoryStore>,
    scroll: ScrollAnchor,
    terminated: bool,
}

impl ChatSession {
    /// Activate a chat session. The connection is started here; a start
    /// failure is logged and the session comes up anyway with the
    /// connection left `Disconnected`, so the surrounding UI stays usable.
    pub async fn start(
        config: HubConfig,
        username: impl Into<String>,
        store: Arc<dyn HistoryStore>,
    ) -> Self {
        let username = username.into();
        let history = Arc::new(Mutex::new(store.load()));
        let scroll = ScrollAnchor::new(Duration::from_millis(config.scroll_settle_ms));
        let connection = Connection::new(config.url.clone());

        // Wire the receive handler before starting so nothing delivered
        // right after the handshake can slip past it. Inbound events from
        // this session's own username are hub echoes of local sends, which
        // are already in history; suppress them entirely.
        {
            let history = history.clone();
            let scroll = scroll.clone();
            let me = username.clone();
            connection.on_receive(move |sender, text| {
                if sender == me {
                    return;
                }
                history.lock().push(ChatMessage::received(format!("{}: {}", sender, text)));
                scroll.request();
            });
        }

        if let Err(e) = connection.start().await {
            error!("[session] Connection start failed: {}", e);
        }

        info!(
            "[session] Activated for {} with {} loaded message(s)",
            username,
            history.lock().len()
        );

        Self { username, input: String::new(), history, connection, store, scroll, terminated: false }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    /// Snapshot of the current history, in append order.
    pub fn history(&self) -> Vec<ChatMessage> {
        self.history.lock().clone()
    }

    /// Replace the input buffer (the UI's text field).
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// The deferred scroll-to-bottom signal; view layers wait on
    /// `scroll().settled()`.
    pub fn scroll(&self) -> &ScrollAnchor {
        &self.scroll
    }

    /// Send the current input buffer. Whitespace-only input is ignored
    /// (not an error). The history entry is appended only after the
    /// transport confirms the write; on failure the input buffer is left
    /// intact so the user can retry.
    pub async fn send_message(&mut self) -> ChatResult<()> {
        if self.terminated {
            return Err(ChatError::Terminated);
        }
        let text = self.input.trim().to_string();
        if text.is_empty() {
            return Ok(());
        }

        match self.connection.send(&self.username, &text).await {
            Ok(()) => {
                self.history
                    .lock()
                    .push(ChatMessage::sent(format!("{}: {}", self.username, text)));
                self.input.clear();
                self.scroll.request();
                Ok(())
            }
            Err(e) => {
                error!("[session] Error while sending message: {}", e);
                Err(e)
            }
        }
    }

    /// Tear down: persist the history snapshot and stop the connection.
    /// Both steps are best-effort and failures are logged only; teardown
    /// always completes. Idempotent.
    pub async fn close(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        let snapshot = self.history.lock().clone();
        if let Err(e) = self.store.save(&snapshot) {
            error!("[session] Error while persisting history: {}", e);
        }
        self.connection.stop().await;
        info!("[session] Closed ({} message(s) persisted)", snapshot.len());
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::MemoryStore;
    use crate::testhub::{spawn_hub, wait_for};

    fn config_for(url: &str) -> HubConfig {
        HubConfig { url: url.into(), ..HubConfig::default() }
    }

    async fn session_on_hub(url: &str, username: &str) -> (ChatSession, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new("messages"));
        let session = ChatSession::start(config_for(url), username, store.clone()).await;
        (session, store)
    }

    #[tokio::test]
    async fn successful_sends_append_in_order() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        for text in ["one", "two", "three"] {
            session.set_input(text);
            session.send_message().await.unwrap();
        }

        let history = session.history();
        assert_eq!(history.len(), 3);
        assert_eq!(history[0], ChatMessage::sent("alice: one"));
        assert_eq!(history[1], ChatMessage::sent("alice: two"));
        assert_eq!(history[2], ChatMessage::sent("alice: three"));
        assert!(session.input().is_empty());
        session.close().await;
    }

    #[tokio::test]
    async fn self_echo_is_suppressed() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        session.set_input("hi");
        session.send_message().await.unwrap();

        // The hub echoes the send back to all clients including alice;
        // give the echo time to arrive and confirm it was dropped.
        tokio::time::sleep(Duration::from_millis(300)).await;
        let history = session.history();
        assert_eq!(history.len(), 1);
        assert!(history[0].is_sender);
        session.close().await;
    }

    #[tokio::test]
    async fn remote_events_append_with_prefix() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        hub.broadcast("bob", "yo");
        assert!(wait_for(|| !session.history().is_empty(), Duration::from_secs(5)).await);
        assert_eq!(session.history()[0], ChatMessage::received("bob: yo"));
        session.close().await;
    }

    #[tokio::test]
    async fn back_to_back_remote_events_keep_arrival_order() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        hub.broadcast("bob", "first");
        hub.broadcast("bob", "second");
        assert!(wait_for(|| session.history().len() == 2, Duration::from_secs(5)).await);
        let history = session.history();
        assert_eq!(history[0].text, "bob: first");
        assert_eq!(history[1].text, "bob: second");
        session.close().await;
    }

    #[tokio::test]
    async fn whitespace_input_is_a_noop() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        session.set_input("   ");
        session.send_message().await.unwrap();
        assert!(session.history().is_empty());
        session.close().await;
    }

    #[tokio::test]
    async fn failed_send_keeps_history_and_input() {
        // Port 9 (discard) refuses WebSocket handshakes, so the session
        // comes up with a dead connection.
        let (mut session, _) = session_on_hub("ws://127.0.0.1:9/chathub", "alice").await;
        assert_eq!(session.connection_state(), ConnectionState::Disconnected);

        session.set_input("hi");
        assert!(session.send_message().await.is_err());
        assert!(session.history().is_empty());
        assert_eq!(session.input(), "hi");
        session.close().await;
    }

    #[tokio::test]
    async fn teardown_persists_and_next_session_reloads() {
        let hub = spawn_hub().await;
        let store = Arc::new(MemoryStore::new("messages"));

        let mut first =
            ChatSession::start(config_for(&hub.url), "alice", store.clone()).await;
        first.set_input("hi");
        first.send_message().await.unwrap();
        first.close().await;

        let second = ChatSession::start(config_for(&hub.url), "alice", store.clone()).await;
        assert_eq!(second.history(), vec![ChatMessage::sent("alice: hi")]);
    }

    #[tokio::test]
    async fn close_is_idempotent_and_terminates() {
        let hub = spawn_hub().await;
        let (mut session, store) = session_on_hub(&hub.url, "alice").await;

        session.close().await;
        session.close().await; // no-op
        assert_eq!(session.connection_state(), ConnectionState::Stopped);
        assert!(store.load().is_empty());

        session.set_input("too late");
        assert!(matches!(session.send_message().await.unwrap_err(), ChatError::Terminated));
    }

    #[tokio::test]
    async fn receive_handler_survives_reconnect() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        hub.kick();
        assert!(
            wait_for(
                || session.connection_state() == ConnectionState::Reconnecting,
                Duration::from_secs(5)
            )
            .await
        );
        assert!(
            wait_for(
                || session.connection_state() == ConnectionState::Connected,
                Duration::from_secs(15)
            )
            .await,
            "connection never recovered"
        );

        hub.broadcast("bob", "still here?");
        assert!(wait_for(|| session.history().len() == 1, Duration::from_secs(5)).await);
        assert_eq!(session.history()[0], ChatMessage::received("bob: still here?"));
        session.close().await;
    }

    #[tokio::test]
    async fn sends_trigger_scroll_requests() {
        let hub = spawn_hub().await;
        let (mut session, _) = session_on_hub(&hub.url, "alice").await;

        session.set_input("hi");
        session.send_message().await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), session.scroll().settled())
            .await
            .expect("send never requested a scroll");
        session.close().await;
    }
}
