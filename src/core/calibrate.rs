//! Calibration: derive a ticks-per-centimeter ratio from a reference roll

use super::error::SessionError;

/// Length of the reference roll in centimeters.
///
/// Fixed by protocol rather than user-supplied: the instructions given to
/// the operator ("roll exactly 30 cm") must always match what the math
/// assumes. Any future variable-reference support has to preserve this
/// default.
pub const REFERENCE_DISTANCE_CM: f64 = 30.0;

/// Compute the calibration ratio (ticks per centimeter) from the ticks
/// accumulated while rolling over `reference_cm` of physical distance.
///
/// Pure and deterministic. Zero ticks means the operator never rolled the
/// wheel, which cannot produce a usable ratio.
pub fn compute_ratio(ticks: u64, reference_cm: f64) -> Result<f64, SessionError> {
    if ticks == 0 {
        return Err(SessionError::NoScrollDetected);
    }
    Ok(ticks as f64 / reference_cm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_ticks_is_rejected() {
        assert_eq!(
            compute_ratio(0, REFERENCE_DISTANCE_CM),
            Err(SessionError::NoScrollDetected)
        );
    }

    #[test]
    fn test_ratio_is_ticks_per_cm() {
        assert_eq!(compute_ratio(300, 30.0), Ok(10.0));
        assert_eq!(compute_ratio(45, 30.0), Ok(1.5));
    }

    #[test]
    fn test_single_tick_yields_positive_ratio() {
        let ratio = compute_ratio(1, REFERENCE_DISTANCE_CM).unwrap();
        assert!(ratio > 0.0);
    }
}
