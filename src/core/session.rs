//! Session controller - the calibration/measurement state machine
//!
//! Coordinates the scroll source subscription lifecycle, mode transitions
//! and ratio storage, and hands out consistent snapshots to whichever front
//! end asks. One instance owns the process's session state; dependencies
//! (counter, source) are injected so the machine is testable without a
//! terminal.
//!
//! Locking: two locks with distinct jobs.
//! - `subscription` serializes transitions and owns the live subscription
//!   handle. Subscribing/unsubscribing can block briefly on capture
//!   registration and reader-thread join, and only ever happens under this
//!   lock.
//! - `state` guards mode + ratio and is held only for reads and field
//!   writes, so `snapshot()` stays cheap while a transition is mid-flight.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use super::calibrate::{self, REFERENCE_DISTANCE_CM};
use super::counter::TickCounter;
use super::error::SessionError;
use super::measure::{self, DistanceReport};
use crate::source::{ScrollSource, Subscription};

/// What the controller is currently doing.
///
/// The scroll source is subscribed if and only if the mode is non-idle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Idle,
    Calibrating,
    Measuring,
}

impl Mode {
    /// Wire name used by the status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "idle",
            Mode::Calibrating => "calibrate",
            Mode::Measuring => "measure",
        }
    }
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful calibration, for display by the front ends.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationOutcome {
    pub clicks: u64,
    pub clicks_per_cm: f64,
    pub cm_per_click: f64,
}

/// Point-in-time view of the session, cheap to take from any context.
#[derive(Debug, Clone, Copy)]
pub struct Snapshot {
    pub mode: Mode,
    pub ticks: u64,
    pub ratio: Option<f64>,
    /// Distances for the current tick count; all zeros when uncalibrated.
    pub report: DistanceReport,
}

/// Mode and ratio, guarded together: a calibration finish and a concurrent
/// measurement start must never interleave inconsistently.
#[derive(Debug)]
struct SessionState {
    mode: Mode,
    ratio: Option<f64>,
}

pub struct SessionController {
    counter: Arc<TickCounter>,
    source: Arc<dyn ScrollSource>,
    subscription: Mutex<Option<Subscription>>,
    state: Mutex<SessionState>,
}

impl SessionController {
    pub fn new(source: Arc<dyn ScrollSource>) -> Self {
        Self {
            counter: Arc::new(TickCounter::new()),
            source,
            subscription: Mutex::new(None),
            state: Mutex::new(SessionState {
                mode: Mode::Idle,
                ratio: None,
            }),
        }
    }

    /// Begin a calibration session: reset the counter, subscribe the source
    /// and enter Calibrating. Rejected as `AlreadyActive` while any session
    /// is running.
    pub fn start_calibration(&self) -> Result<(), SessionError> {
        let mut subscription = lock(&self.subscription);
        if lock(&self.state).mode != Mode::Idle {
            return Err(SessionError::AlreadyActive);
        }

        let handle = self.subscribe()?;
        self.counter.reset();
        *subscription = Some(handle);
        lock(&self.state).mode = Mode::Calibrating;
        tracing::info!("Calibration started");
        Ok(())
    }

    /// End the active session and derive the ratio from the accumulated
    /// ticks against the 30 cm reference.
    ///
    /// The stop half always completes: the source is unsubscribed and the
    /// mode returns to Idle even when no scroll was detected, in which case
    /// any previously stored ratio survives for the operator to retry.
    pub fn finish_calibration(&self) -> Result<CalibrationOutcome, SessionError> {
        let mut subscription = lock(&self.subscription);
        // Drop outside the state lock: joining the reader thread can block
        drop(subscription.take());

        let clicks = self.counter.read();
        let computed = calibrate::compute_ratio(clicks, REFERENCE_DISTANCE_CM);

        let mut state = lock(&self.state);
        state.mode = Mode::Idle;
        let ratio = computed?;
        state.ratio = Some(ratio);
        tracing::info!(clicks, ratio, "Calibration complete");
        Ok(CalibrationOutcome {
            clicks,
            clicks_per_cm: ratio,
            cm_per_click: 1.0 / ratio,
        })
    }

    /// Begin a measurement session. Requires a prior successful calibration;
    /// rejected with no state change otherwise.
    pub fn start_measurement(&self) -> Result<(), SessionError> {
        let mut subscription = lock(&self.subscription);
        {
            let state = lock(&self.state);
            if state.ratio.is_none() {
                return Err(SessionError::NotCalibrated);
            }
            if state.mode != Mode::Idle {
                return Err(SessionError::AlreadyActive);
            }
        }

        let handle = self.subscribe()?;
        self.counter.reset();
        *subscription = Some(handle);
        lock(&self.state).mode = Mode::Measuring;
        tracing::info!("Measurement started");
        Ok(())
    }

    /// Stop the active session and return to Idle. The counter is retained
    /// so a final reading can be taken after stopping. No-op from Idle.
    pub fn stop_measurement(&self) {
        let mut subscription = lock(&self.subscription);
        drop(subscription.take());
        lock(&self.state).mode = Mode::Idle;
        tracing::info!("Session stopped");
    }

    /// Zero the tick counter without touching mode or subscription. Valid
    /// in any state.
    pub fn reset(&self) {
        self.counter.reset();
    }

    /// Current mode, ticks, ratio and derived distances. Never blocks on a
    /// transition in progress.
    pub fn snapshot(&self) -> Snapshot {
        let (mode, ratio) = {
            let state = lock(&self.state);
            (state.mode, state.ratio)
        };
        let ticks = self.counter.read();
        let report = measure::compute_distance(ticks, ratio)
            .unwrap_or_else(|_| DistanceReport::zero(ticks));
        Snapshot {
            mode,
            ticks,
            ratio,
            report,
        }
    }

    fn subscribe(&self) -> Result<Subscription, SessionError> {
        let counter = self.counter.clone();
        self.source
            .subscribe(Arc::new(move |delta| counter.increment(delta)))
            .map_err(|e| SessionError::Source(e.to_string()))
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Lock that shrugs off poisoning: session state stays usable even if a
/// front-end thread panicked mid-hold.
fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{ScrollSink, ScrollSource};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Source the tests drive by hand: remembers the active sink so ticks
    /// can be injected, and counts live subscriptions.
    #[derive(Default)]
    struct ManualSource {
        sink: Mutex<Option<ScrollSink>>,
        active: Arc<AtomicUsize>,
    }

    impl ManualSource {
        fn push(&self, delta: i64) {
            if let Some(sink) = self.sink.lock().unwrap().as_ref() {
                sink(delta);
            }
        }

        fn active_subscriptions(&self) -> usize {
            self.active.load(Ordering::SeqCst)
        }
    }

    impl ScrollSource for Arc<ManualSource> {
        fn subscribe(&self, sink: ScrollSink) -> anyhow::Result<Subscription> {
            *self.sink.lock().unwrap() = Some(sink);
            self.active.fetch_add(1, Ordering::SeqCst);
            let active = self.active.clone();
            let slot = self.clone();
            Ok(Subscription::new(move || {
                *slot.sink.lock().unwrap() = None;
                active.fetch_sub(1, Ordering::SeqCst);
            }))
        }
    }

    fn controller() -> (SessionController, Arc<ManualSource>) {
        let source = Arc::new(ManualSource::default());
        let controller = SessionController::new(Arc::new(source.clone()));
        (controller, source)
    }

    fn calibrate_with(controller: &SessionController, source: &ManualSource, ticks: i64) {
        controller.start_calibration().unwrap();
        for _ in 0..ticks {
            source.push(1);
        }
        controller.finish_calibration().unwrap();
    }

    #[test]
    fn test_calibration_happy_path() {
        let (controller, source) = controller();

        controller.start_calibration().unwrap();
        assert_eq!(controller.snapshot().mode, Mode::Calibrating);
        assert_eq!(source.active_subscriptions(), 1);

        for _ in 0..300 {
            source.push(-1);
        }
        let outcome = controller.finish_calibration().unwrap();
        assert_eq!(outcome.clicks, 300);
        assert_eq!(outcome.clicks_per_cm, 10.0);
        assert_eq!(outcome.cm_per_click, 0.1);

        let snap = controller.snapshot();
        assert_eq!(snap.mode, Mode::Idle);
        assert_eq!(snap.ratio, Some(10.0));
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_failed_calibration_returns_idle_and_keeps_prior_ratio() {
        let (controller, source) = controller();
        calibrate_with(&controller, &source, 150);

        controller.start_calibration().unwrap();
        // no ticks this time
        assert_eq!(
            controller.finish_calibration(),
            Err(SessionError::NoScrollDetected)
        );

        let snap = controller.snapshot();
        assert_eq!(snap.mode, Mode::Idle);
        assert_eq!(snap.ratio, Some(5.0)); // 150 / 30
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_measurement_requires_calibration() {
        let (controller, _source) = controller();
        assert_eq!(
            controller.start_measurement(),
            Err(SessionError::NotCalibrated)
        );
        assert_eq!(controller.snapshot().mode, Mode::Idle);
    }

    #[test]
    fn test_measure_round_trip() {
        let (controller, source) = controller();
        calibrate_with(&controller, &source, 300); // 10 ticks/cm

        controller.start_measurement().unwrap();
        for _ in 0..100 {
            source.push(1);
        }
        controller.stop_measurement();

        // Counter retained after stop for a final reading
        let snap = controller.snapshot();
        assert_eq!(snap.mode, Mode::Idle);
        assert_eq!(snap.ticks, 100);
        assert_eq!(snap.report.distance_cm, 10.0);
        assert_eq!(snap.report.distance_mm, 100.0);
        assert_eq!(snap.report.distance_m, 0.1);
    }

    #[test]
    fn test_start_while_active_is_rejected_without_transition() {
        let (controller, source) = controller();
        calibrate_with(&controller, &source, 30);

        controller.start_measurement().unwrap();
        assert_eq!(
            controller.start_calibration(),
            Err(SessionError::AlreadyActive)
        );
        assert_eq!(
            controller.start_measurement(),
            Err(SessionError::AlreadyActive)
        );
        assert_eq!(controller.snapshot().mode, Mode::Measuring);
        assert_eq!(source.active_subscriptions(), 1);
        controller.stop_measurement();
    }

    #[test]
    fn test_stop_from_idle_is_a_noop() {
        let (controller, source) = controller();
        controller.stop_measurement();
        assert_eq!(controller.snapshot().mode, Mode::Idle);
        assert_eq!(source.active_subscriptions(), 0);
    }

    #[test]
    fn test_reset_zeroes_ticks_without_changing_mode() {
        let (controller, source) = controller();
        controller.start_calibration().unwrap();
        source.push(5);
        controller.reset();

        let snap = controller.snapshot();
        assert_eq!(snap.ticks, 0);
        assert_eq!(snap.mode, Mode::Calibrating);
        controller.finish_calibration().unwrap_err();
    }

    #[test]
    fn test_recalibration_overwrites_ratio() {
        let (controller, source) = controller();
        calibrate_with(&controller, &source, 300);
        assert_eq!(controller.snapshot().ratio, Some(10.0));
        calibrate_with(&controller, &source, 600);
        assert_eq!(controller.snapshot().ratio, Some(20.0));
    }

    #[test]
    fn test_uncalibrated_snapshot_reports_zero_distances() {
        let (controller, source) = controller();
        controller.start_calibration().unwrap();
        source.push(42);

        let snap = controller.snapshot();
        assert_eq!(snap.ticks, 42);
        assert_eq!(snap.ratio, None);
        assert_eq!(snap.report.distance_cm, 0.0);
        assert_eq!(snap.report.distance_in, 0.0);
    }

    #[test]
    fn test_snapshot_does_not_wait_on_unsubscribe() {
        use std::time::{Duration, Instant};

        // Source whose release blocks, standing in for a slow capture
        // teardown, so the test can probe snapshot latency mid-transition.
        struct SlowReleaseSource;

        impl ScrollSource for SlowReleaseSource {
            fn subscribe(&self, _sink: ScrollSink) -> anyhow::Result<Subscription> {
                Ok(Subscription::new(|| {
                    std::thread::sleep(Duration::from_millis(300));
                }))
            }
        }

        let controller = Arc::new(SessionController::new(Arc::new(SlowReleaseSource)));
        controller.start_calibration().unwrap();

        let finisher = {
            let controller = controller.clone();
            std::thread::spawn(move || {
                let _ = controller.finish_calibration();
            })
        };

        // Let the finisher reach the blocking release
        std::thread::sleep(Duration::from_millis(50));
        let started = Instant::now();
        let _ = controller.snapshot();
        assert!(
            started.elapsed() < Duration::from_millis(150),
            "snapshot stalled behind an in-flight unsubscribe"
        );
        finisher.join().unwrap();
    }

    #[test]
    fn test_snapshot_readable_while_session_active() {
        let (controller, source) = controller();
        let controller = Arc::new(controller);
        controller.start_calibration().unwrap();

        // Poll from another thread while ticks stream in, the way the HTTP
        // front end does every 100ms.
        let poller = {
            let controller = controller.clone();
            std::thread::spawn(move || {
                for _ in 0..100 {
                    let snap = controller.snapshot();
                    assert_eq!(snap.mode, Mode::Calibrating);
                }
            })
        };
        for _ in 0..100 {
            source.push(1);
        }
        poller.join().unwrap();

        assert_eq!(controller.snapshot().ticks, 100);
        controller.finish_calibration().unwrap();
    }
}
