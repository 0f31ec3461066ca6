// ── Hubchat: Library Root ──────────────────────────────────────────────────
// Client core for a two-party chat backed by a real-time messaging hub:
// one reconnecting duplex WebSocket connection, a two-field named wire
// event, session-scoped history persistence, and a session controller that
// ties them together.
//
// Dependency rule (one-way):
//   session → connection → wire/backoff
//   session → history/scroll/config
// Nothing below the session controller knows about identity or history.

pub mod backoff;
pub mod config;
pub mod connection;
pub mod error;
pub mod history;
pub mod scroll;
pub mod session;
pub mod wire;

#[cfg(test)]
mod testhub;

pub use config::HubConfig;
pub use connection::{Connection, ConnectionState};
pub use error::{ChatError, ChatResult};
pub use history::{ChatMessage, FileStore, HistoryStore, MemoryStore};
pub use scroll::ScrollAnchor;
pub use session::ChatSession;
pub use wire::ChatEvent;
