// ── Hubchat: Message History & Persistence Buffer ──────────────────────────
// The in-memory message record plus the session-scoped durable store it is
// snapshotted into. The store is written exactly once per session, at
// teardown, and read exactly once, at activation. A hard crash between
// those points loses unsaved messages; that trade-off is deliberate.
//
// `load` never fails: an absent or malformed payload is logged and treated
// as an empty history so a bad snapshot can never wedge the chat.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::ChatResult;

// ── Chat message ───────────────────────────────────────────────────────────

/// One displayed chat line. `text` is the author-prefixed display string
/// ("alice: hi"); `is_sender` is true iff this client's own confirmed send
/// produced the entry. It is never inferred from username equality on
/// receipt. Immutable once created; history is append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    #[serde(rename = "isSender")]
    pub is_sender: bool,
}

impl ChatMessage {
    pub fn sent(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_sender: true }
    }

    pub fn received(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_sender: false }
    }
}

// ── Store contract ─────────────────────────────────────────────────────────

/// Session-scoped durable store for the message history. One full-snapshot
/// value per session key; `save` overwrites whatever was there.
pub trait HistoryStore: Send + Sync {
    /// Read the snapshot for this store's session key. Absent or malformed
    /// data yields an empty history, never an error.
    fn load(&self) -> Vec<ChatMessage>;

    /// Serialize and write the full history, replacing any prior snapshot.
    fn save(&self, history: &[ChatMessage]) -> ChatResult<()>;
}

fn parse_snapshot(key: &str, raw: &str) -> Vec<ChatMessage> {
    match serde_json::from_str(raw) {
        Ok(history) => history,
        Err(e) => {
            warn!("[store] Malformed snapshot under {:?} treated as empty: {}", key, e);
            vec![]
        }
    }
}

// ── In-memory store ────────────────────────────────────────────────────────

/// Process-lifetime key-value store. Clones share the same backing map, so a
/// recreated session controller sees what its predecessor saved, while a new
/// `MemoryStore::new` starts a fresh session scope.
#[derive(Clone)]
pub struct MemoryStore {
    key: String,
    slots: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into(), slots: Arc::new(Mutex::new(HashMap::new())) }
    }
}

impl HistoryStore for MemoryStore {
    fn load(&self) -> Vec<ChatMessage> {
        match self.slots.lock().get(&self.key) {
            Some(raw) => parse_snapshot(&self.key, raw),
            None => vec![],
        }
    }

    fn save(&self, history: &[ChatMessage]) -> ChatResult<()> {
        let raw = serde_json::to_string(history)?;
        self.slots.lock().insert(self.key.clone(), raw);
        Ok(())
    }
}

// ── File-backed store ──────────────────────────────────────────────────────

/// One JSON file per session key under a base directory. Used by the CLI so
/// history survives process restarts within the same state directory.
pub struct FileStore {
    dir: PathBuf,
    key: String,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self { dir: dir.into(), key: key.into() }
    }

    fn path(&self) -> PathBuf {
        self.dir.join(format!("{}.json", self.key))
    }
}

impl HistoryStore for FileStore {
    fn load(&self) -> Vec<ChatMessage> {
        let path = self.path();
        match std::fs::read_to_string(&path) {
            Ok(raw) => parse_snapshot(&self.key, &raw),
            Err(e) => {
                debug!("[store] No snapshot at {}: {}", path.display(), e);
                vec![]
            }
        }
    }

    fn save(&self, history: &[ChatMessage]) -> ChatResult<()> {
        std::fs::create_dir_all(&self.dir)?;
        let raw = serde_json::to_string(history)?;
        std::fs::write(self.path(), raw)?;
        Ok(())
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
