//! Metric normalization onto the common strain scale
//!
//! Every report metric already arrives on a 0-10 scale; normalization is a
//! polarity adjustment only. Restorative metrics (sleep recovery, recovery
//! from load) are inverted so that all four outputs read "higher = more
//! allostatic strain".

use crate::error::ScoringError;
use crate::models::{DailyReport, NormalizedFactors};

/// Upper bound of the shared metric scale
pub const SCALE_MAX: f64 = 10.0;

/// Stateless polarity/range normalizer
pub struct MetricNormalizer;

impl MetricNormalizer {
    /// Map a report onto the strain scale.
    ///
    /// Returns `OutOfRangeInput` naming the offending field if any metric
    /// falls outside [0,10]; the caller skips that day, it is never coerced.
    pub fn normalize(report: &DailyReport) -> Result<NormalizedFactors, ScoringError> {
        Self::check_range(report, "sleep_recovery", report.sleep_recovery)?;
        Self::check_range(report, "physical_load", report.physical_load)?;
        Self::check_range(report, "recovery_from_load", report.recovery_from_load)?;
        Self::check_range(report, "psychological_stress", report.psychological_stress)?;
        Self::check_range(report, "energy_level", report.energy_level)?;

        Ok(NormalizedFactors {
            sleep: SCALE_MAX - report.sleep_recovery,
            load: report.physical_load,
            recovery: SCALE_MAX - report.recovery_from_load,
            stress: report.psychological_stress,
        })
    }

    fn check_range(
        report: &DailyReport,
        field: &'static str,
        value: f64,
    ) -> Result<(), ScoringError> {
        if !value.is_finite() || !(0.0..=SCALE_MAX).contains(&value) {
            return Err(ScoringError::OutOfRangeInput {
                date: report.date,
                field,
                value,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn report(sleep: f64, load: f64, recovery: f64, stress: f64, energy: f64) -> DailyReport {
        DailyReport {
            date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            sleep_recovery: sleep,
            physical_load: load,
            recovery_from_load: recovery,
            psychological_stress: stress,
            energy_level: energy,
        }
    }

    #[test]
    fn test_polarity_flips() {
        let factors = MetricNormalizer::normalize(&report(2.0, 7.0, 8.0, 4.0, 6.0)).unwrap();
        // Poor sleep recovery (2) means high sleep strain (8)
        assert_eq!(factors.sleep, 8.0);
        // Load and stress pass through unchanged
        assert_eq!(factors.load, 7.0);
        assert_eq!(factors.stress, 4.0);
        // Good recovery (8) means low residual strain (2)
        assert_eq!(factors.recovery, 2.0);
    }

    #[test]
    fn test_extremes() {
        let max_strain = MetricNormalizer::normalize(&report(0.0, 10.0, 0.0, 10.0, 0.0)).unwrap();
        assert_eq!(max_strain.sleep, 10.0);
        assert_eq!(max_strain.load, 10.0);
        assert_eq!(max_strain.recovery, 10.0);
        assert_eq!(max_strain.stress, 10.0);

        let no_strain = MetricNormalizer::normalize(&report(10.0, 0.0, 10.0, 0.0, 10.0)).unwrap();
        assert_eq!(no_strain.sleep, 0.0);
        assert_eq!(no_strain.load, 0.0);
        assert_eq!(no_strain.recovery, 0.0);
        assert_eq!(no_strain.stress, 0.0);
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = MetricNormalizer::normalize(&report(2.0, 11.0, 8.0, 4.0, 6.0)).unwrap_err();
        match err {
            ScoringError::OutOfRangeInput { field, value, .. } => {
                assert_eq!(field, "physical_load");
                assert_eq!(value, 11.0);
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = MetricNormalizer::normalize(&report(2.0, 7.0, 8.0, 4.0, -0.5)).unwrap_err();
        assert!(matches!(
            err,
            ScoringError::OutOfRangeInput {
                field: "energy_level",
                ..
            }
        ));
    }

    #[test]
    fn test_non_finite_rejected() {
        assert!(MetricNormalizer::normalize(&report(f64::NAN, 7.0, 8.0, 4.0, 6.0)).is_err());
        assert!(MetricNormalizer::normalize(&report(2.0, f64::INFINITY, 8.0, 4.0, 6.0)).is_err());
    }
}
