// ── Hubchat: Scroll Anchor ─────────────────────────────────────────────────
// Deferred, coalescing "scroll to bottom" signal. A history mutation and the
// view update that shows it are not synchronized within one tick, so the
// anchor waits a short settle window after the last request before waking
// its listener. Requests arriving while a wake is pending are absorbed into
// it; a burst of appends produces one wake.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct ScrollAnchor {
    pending: Arc<AtomicBool>,
    notify: Arc<Notify>,
    settle: Duration,
}

impl ScrollAnchor {
    pub fn new(settle: Duration) -> Self {
        Self {
            pending: Arc::new(AtomicBool::new(false)),
            notify: Arc::new(Notify::new()),
            settle,
        }
    }

    /// Request a scroll-to-bottom after the settle window. Coalesces:
    /// requests made while one is already pending are no-ops.
    /// Must be called from within a Tokio runtime.
    pub fn request(&self) {
        if self.pending.swap(true, Ordering::SeqCst) {
            return;
        }
        let pending = self.pending.clone();
        let notify = self.notify.clone();
        let settle = self.settle;
        tokio::spawn(async move {
            tokio::time::sleep(settle).await;
            pending.store(false, Ordering::SeqCst);
            notify.notify_one();
        });
    }

    /// Wait until a requested scroll has settled. Completes immediately if a
    /// wake fired since the last wait.
    pub async fn settled(&self) {
        self.notify.notified().await;
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
