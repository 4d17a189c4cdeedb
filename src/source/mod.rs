//! Scroll event sources
//!
//! A source pushes signed scroll-wheel deltas into a sink for as long as a
//! subscription is held. The core only ever sees the sink side; hardware
//! and terminal semantics stay behind this boundary.
//!
//! Backends:
//! - `terminal`: crossterm mouse capture, the real input path
//! - `simulated`: timer-driven synthetic ticks for demo mode

pub mod simulated;
pub mod terminal;

use std::sync::Arc;

pub use simulated::SimulatedScrollSource;
pub use terminal::TerminalScrollSource;

/// Callback receiving signed scroll deltas from a source's reader thread.
pub type ScrollSink = Arc<dyn Fn(i64) + Send + Sync>;

/// A push-based producer of scroll-wheel deltas.
///
/// Subscribing may block briefly (capture registration happens on the
/// calling thread), so the session controller only subscribes inside its
/// start/stop transitions, never on the status path.
pub trait ScrollSource: Send + Sync {
    fn subscribe(&self, sink: ScrollSink) -> anyhow::Result<Subscription>;
}

/// RAII handle for an active subscription.
///
/// Dropping the handle stops the backend's reader thread and releases any
/// capture it registered. Holding release in `Drop` guarantees the
/// unsubscribe half of a transition runs on every exit path, including the
/// failed-calibration one.
pub struct Subscription {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_drop_runs_release_exactly_once() {
        let released = Arc::new(AtomicBool::new(false));
        let flag = released.clone();
        let sub = Subscription::new(move || flag.store(true, Ordering::SeqCst));
        assert!(!released.load(Ordering::SeqCst));
        drop(sub);
        assert!(released.load(Ordering::SeqCst));
    }
}
