// Core measurement engine - counter, calibration, measurement, session
//
// Everything in here is front-end agnostic: the same controller instance is
// driven by the blocking console menu and polled by the HTTP handlers.

pub mod calibrate;
pub mod counter;
pub mod error;
pub mod measure;
pub mod session;

pub use calibrate::REFERENCE_DISTANCE_CM;
pub use counter::TickCounter;
pub use error::SessionError;
pub use measure::DistanceReport;
pub use session::{CalibrationOutcome, Mode, SessionController, Snapshot};
