// ── Hubchat: Reconnect Backoff ─────────────────────────────────────────────
// Exponential delay with ±25% jitter for the connection supervisor's
// reconnect loop. Base 1s doubling per attempt, capped at 5 minutes,
// floored at 100ms so a zero-jitter roll never busy-spins.

use std::time::{Duration, SystemTime};

/// Initial reconnect delay in milliseconds (doubles each attempt).
const INITIAL_DELAY_MS: u64 = 1_000;

/// Maximum reconnect delay cap in milliseconds (5 minutes).
const MAX_DELAY_MS: u64 = 300_000;

/// Sleep with exponential backoff + ±25% jitter.
/// `attempt` is 0-based. Returns the actual delay duration for logging.
pub async fn reconnect_delay(attempt: u32) -> Duration {
    let delay = Duration::from_millis(apply_jitter(delay_ms(attempt)));
    tokio::time::sleep(delay).await;
    delay
}

/// Compute the un-jittered delay for a given attempt. The exponent is
/// clamped so the shift cannot overflow on pathological attempt counts.
fn delay_ms(attempt: u32) -> u64 {
    let base_ms = INITIAL_DELAY_MS * 2u64.pow(attempt.min(12));
    base_ms.min(MAX_DELAY_MS)
}

/// Apply ±25% jitter to prevent thundering-herd effects.
fn apply_jitter(base_ms: u64) -> u64 {
    let jitter_range = (base_ms / 4) as i64;
    if jitter_range == 0 {
        return base_ms.max(100);
    }
    let offset = (rand_jitter() % (2 * jitter_range + 1)) - jitter_range;
    let result = base_ms as i64 + offset;
    result.max(100) as u64
}

/// Simple jitter source using system clock nanos (no extra crate needed).
fn rand_jitter() -> i64 {
    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    (nanos % 1000) as i64
}

// ── Tests ──────────────────────────────────────────────────────────────────
