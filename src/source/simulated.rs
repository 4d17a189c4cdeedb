//! Simulated scroll source for demo mode
//!
//! Emits one tick at a fixed cadence for as long as a subscription is held,
//! so the console and web front ends can be exercised without a mouse on a
//! ruler. Run with: scrolltape serve --demo

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use super::{ScrollSink, ScrollSource, Subscription};

/// Default cadence: ~66 ticks/second, roughly what a brisk physical roll
/// produces.
const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(15);

#[derive(Debug)]
pub struct SimulatedScrollSource {
    tick_interval: Duration,
}

impl SimulatedScrollSource {
    pub fn new() -> Self {
        Self {
            tick_interval: DEFAULT_TICK_INTERVAL,
        }
    }

    #[cfg(test)]
    pub fn with_interval(tick_interval: Duration) -> Self {
        Self { tick_interval }
    }
}

impl Default for SimulatedScrollSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ScrollSource for SimulatedScrollSource {
    fn subscribe(&self, sink: ScrollSink) -> Result<Subscription> {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = stop.clone();
        let interval = self.tick_interval;

        let ticker = std::thread::spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                sink(1);
                std::thread::sleep(interval);
            }
        });

        tracing::debug!("Simulated scroll source started");

        Ok(Subscription::new(move || {
            stop.store(true, Ordering::Relaxed);
            let _ = ticker.join();
            tracing::debug!("Simulated scroll source stopped");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;

    #[test]
    fn test_ticks_flow_only_while_subscribed() {
        let source = SimulatedScrollSource::with_interval(Duration::from_millis(1));
        let count = Arc::new(AtomicU64::new(0));
        let sink_count = count.clone();

        let sub = source
            .subscribe(Arc::new(move |_| {
                sink_count.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        std::thread::sleep(Duration::from_millis(50));
        drop(sub);
        let at_stop = count.load(Ordering::SeqCst);
        assert!(at_stop > 0);

        // No ticks after the subscription is released
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(count.load(Ordering::SeqCst), at_stop);
    }
}
