//! ID prefix constants and generation.
//!
//! IDs look like `req-3f9a0c1d2b7e4a55`: a short prefix naming the entity
//! followed by 16 lowercase hex characters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub const PREFIX_REQUEST: &str = "req";
pub const PREFIX_CLAIM: &str = "clm";

static FALLBACK_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Generate a prefixed random ID.
///
/// Randomness comes from the OS via `getrandom`. If the OS source is
/// unavailable the ID is derived from the wall clock and a process-wide
/// counter, which keeps IDs distinct per call within one process.
#[must_use]
pub fn generate(prefix: &str) -> String {
    let mut bytes = [0u8; 8];
    if getrandom::fill(&mut bytes).is_err() {
        bytes = fallback_bytes();
    }
    let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
    format!("{prefix}-{hex}")
}

/// Generate a request ID (`req-…`).
#[must_use]
pub fn request_id() -> String {
    generate(PREFIX_REQUEST)
}

/// Generate a claim ID (`clm-…`).
#[must_use]
pub fn claim_id() -> String {
    generate(PREFIX_CLAIM)
}

fn fallback_bytes() -> [u8; 8] {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_nanos());
    let count = FALLBACK_COUNTER.fetch_add(1, Ordering::Relaxed);
    #[allow(clippy::cast_possible_truncation)]
    let mixed = (nanos as u64) ^ count.rotate_left(32);
    mixed.to_be_bytes()
}
