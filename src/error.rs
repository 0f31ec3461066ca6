// ── Hubchat: Error Types ───────────────────────────────────────────────────
// Single canonical error enum for the crate, built with `thiserror`.
//
// Design rules:
//   • Variants are coarse-grained by domain (I/O, transport, protocol, config).
//   • `#[from]` wires std/external error conversions automatically.
//   • No failure in this crate is allowed to abort the hosting process; every
//     variant is recoverable and intended to be logged or surfaced, after
//     which the session stays interactively usable.

use thiserror::Error;

// ── Primary error enum ─────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ChatError {
    /// Filesystem or OS-level I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization / deserialization failure.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// WebSocket failure on an established connection.
    #[error("Transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    /// Initial connection attempt to the hub failed (no automatic retry).
    #[error("Connect error: {url}: {message}")]
    Connect { url: String, message: String },

    /// A send was attempted while no connection is active.
    #[error("Not connected to the hub")]
    NotConnected,

    /// An operation was attempted after the session or connection was
    /// terminated. Terminal states accept no further operations.
    #[error("Session terminated")]
    Terminated,

    /// Configuration is invalid or could not be written.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all for errors that do not yet have a dedicated variant.
    /// Prefer adding a specific variant over using this in new code.
    #[error("{0}")]
    Other(String),
}

// ── Convenience constructors ───────────────────────────────────────────────

impl ChatError {
    /// Create a connect error with endpoint and message.
    pub fn connect(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Connect { url: url.into(), message: message.into() }
    }
}

// ── String bridges ─────────────────────────────────────────────────────────
// Allows `?` and `.into()` on plain message strings at call sites that have
// nothing more structured to report.

impl From<String> for ChatError {
    fn from(s: String) -> Self {
        ChatError::Other(s)
    }
}

impl From<&str> for ChatError {
    fn from(s: &str) -> Self {
        ChatError::Other(s.to_string())
    }
}

// ── Convenience alias ──────────────────────────────────────────────────────

/// All fallible operations in this crate return this type.
pub type ChatResult<T> = Result<T, ChatError>;

// ── Tests ──────────────────────────────────────────────────────────────────
