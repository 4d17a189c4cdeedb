//! Core session errors
//!
//! The core returns structured failures to its caller and never terminates
//! the process or retries internally. Front ends translate these into
//! prompts (console) or status codes + JSON bodies (web).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Calibration finished with zero accumulated ticks. The session still
    /// terminates; any previously stored ratio is left intact so the
    /// operator can simply retry.
    #[error("No scroll detected")]
    NoScrollDetected,

    /// Measurement requested before any successful calibration. Rejected
    /// with no state change.
    #[error("Not calibrated")]
    NotCalibrated,

    /// Start requested while a session is already running. Benign: repeated
    /// clicks and keystrokes from a human operator are expected, so callers
    /// treat this as a no-op rather than a hard failure.
    #[error("A session is already active")]
    AlreadyActive,

    /// The scroll source failed to register its capture. No transition
    /// happened; the controller stays in its prior state.
    #[error("Scroll source failed: {0}")]
    Source(String),
}
