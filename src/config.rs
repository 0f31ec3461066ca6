// ── Hubchat: Configuration ─────────────────────────────────────────────────
// Hub endpoint and session knobs, loaded from a JSON file. A missing or
// unparseable file falls back to defaults with a warning; configuration
// problems never stop the client from coming up.

use std::path::Path;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::ChatResult;

/// Default hub endpoint, matching a local dev deployment.
const DEFAULT_HUB_URL: &str = "ws://127.0.0.1:5001/chathub";

/// Default session-scoped storage key for the history snapshot.
const DEFAULT_SESSION_KEY: &str = "messages";

fn default_session_key() -> String {
    DEFAULT_SESSION_KEY.into()
}

fn default_scroll_settle_ms() -> u64 {
    100
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// WebSocket endpoint of the messaging hub. Deployment configuration,
    /// not protocol.
    pub url: String,
    /// Durable-store key the history snapshot lives under.
    #[serde(default = "default_session_key")]
    pub session_key: String,
    /// How long the scroll anchor waits for the view to settle before it
    /// wakes its listener.
    #[serde(default = "default_scroll_settle_ms")]
    pub scroll_settle_ms: u64,
}

impl Default for HubConfig {
    fn default() -> Self {
        HubConfig {
            url: DEFAULT_HUB_URL.into(),
            session_key: default_session_key(),
            scroll_settle_ms: default_scroll_settle_ms(),
        }
    }
}

impl HubConfig {
    /// Load config from a JSON file, falling back to defaults when the file
    /// is absent or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("[config] No config at {}: {} (using defaults)", path.display(), e);
                return Self::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(config) => config,
            Err(e) => {
                warn!("[config] Parse {}: {} (using defaults)", path.display(), e);
                Self::default()
            }
        }
    }

    /// Write config as pretty JSON, creating parent directories as needed.
    pub fn save(&self, path: impl AsRef<Path>) -> ChatResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
