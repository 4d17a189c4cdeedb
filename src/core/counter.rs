//! Thread-safe scroll tick accumulator
//!
//! The scroll source callback runs on its own reader thread while the
//! console or HTTP front end reads the count, so the counter is the one
//! piece of state shared across every context in the process.

use std::sync::atomic::{AtomicU64, Ordering};

/// Accumulated absolute scroll ticks since the last reset.
///
/// Direction is irrelevant for distance: a tick rolled "up" covers the same
/// physical distance as a tick rolled "down", so deltas are summed by
/// magnitude.
#[derive(Debug, Default)]
pub struct TickCounter {
    ticks: AtomicU64,
}

impl TickCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `abs(delta)` to the count.
    ///
    /// Called from the scroll source's reader thread; safe to call
    /// concurrently with `read` and `reset`.
    pub fn increment(&self, delta: i64) {
        self.ticks.fetch_add(delta.unsigned_abs(), Ordering::Relaxed);
    }

    /// Current tick count. Never blocks.
    pub fn read(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Zero the count. Subsequent increments accumulate from zero.
    pub fn reset(&self) {
        self.ticks.store(0, Ordering::Relaxed);
    }
}
