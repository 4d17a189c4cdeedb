//! Measurement: convert accumulated ticks into distance
//!
//! All derived units come from the same `distance_cm`; rounding is a
//! presentation concern left to the front ends.

use serde::Serialize;

use super::error::SessionError;

/// Distances derived from one tick count and one calibration ratio.
///
/// Computed on demand, never stored. Zero ticks is a valid report (the
/// "no movement" case), distinct from being uncalibrated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DistanceReport {
    pub ticks: u64,
    pub clicks_per_cm: f64,
    pub distance_cm: f64,
    pub distance_mm: f64,
    pub distance_m: f64,
    pub distance_in: f64,
}

impl DistanceReport {
    /// Report for an uncalibrated or freshly reset session: all distances
    /// zero, ratio zero. Used by status snapshots so the wire shape stays
    /// stable whether or not a calibration has happened.
    pub fn zero(ticks: u64) -> Self {
        Self {
            ticks,
            clicks_per_cm: 0.0,
            distance_cm: 0.0,
            distance_mm: 0.0,
            distance_m: 0.0,
            distance_in: 0.0,
        }
    }
}

/// Convert ticks to distance using a previously established ratio.
///
/// Fails with `NotCalibrated` when no ratio is available. Everything is
/// computed in f64 with no intermediate truncation.
pub fn compute_distance(ticks: u64, ratio: Option<f64>) -> Result<DistanceReport, SessionError> {
    let ratio = ratio.ok_or(SessionError::NotCalibrated)?;
    let distance_cm = ticks as f64 / ratio;
    Ok(DistanceReport {
        ticks,
        clicks_per_cm: ratio,
        distance_cm,
        distance_mm: distance_cm * 10.0,
        distance_m: distance_cm / 100.0,
        distance_in: distance_cm / 2.54,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncalibrated_is_rejected() {
        assert_eq!(
            compute_distance(100, None),
            Err(SessionError::NotCalibrated)
        );
    }

    #[test]
    fn test_units_derive_from_cm() {
        let report = compute_distance(100, Some(10.0)).unwrap();
        assert_eq!(report.distance_cm, 10.0);
        assert_eq!(report.distance_mm, 100.0);
        assert_eq!(report.distance_m, 0.1);
        assert!((report.distance_in - 3.937).abs() < 0.001);
    }

    #[test]
    fn test_zero_ticks_is_a_valid_zero_report() {
        let report = compute_distance(0, Some(12.5)).unwrap();
        assert_eq!(report.distance_cm, 0.0);
        assert_eq!(report.clicks_per_cm, 12.5);
    }

    #[test]
    fn test_calibrate_then_measure_round_trip() {
        // Calibrating with N ticks over 30 cm then measuring M ticks must
        // yield M * 30 / N centimeters.
        for (n, m) in [(300u64, 100u64), (7, 13), (1, 1), (450, 450)] {
            let ratio = crate::core::calibrate::compute_ratio(n, 30.0).unwrap();
            let report = compute_distance(m, Some(ratio)).unwrap();
            let expected = m as f64 * 30.0 / n as f64;
            assert!((report.distance_cm - expected).abs() < 1e-9);
        }
    }
}
