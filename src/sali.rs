//! Raw Allostatic Load Index computation
//!
//! The raw sALI for a day is the weighted average of the four strain factors
//! scaled into [0,1]. Inputs are guaranteed by the normalizer's range
//! contract and the weight adapter's sum-to-one contract; violations are
//! programming errors, not runtime conditions.

use crate::models::{NormalizedFactors, WeightVector};
use crate::normalize::SCALE_MAX;

/// Stateless score combiner
pub struct SaliCalculator;

impl SaliCalculator {
    /// Combine normalized strain factors and weights into a raw sALI in [0,1].
    pub fn score(factors: &NormalizedFactors, weights: &WeightVector) -> f64 {
        assert!(
            weights.is_valid(),
            "weight vector violates sum-to-one contract: {weights:?}"
        );
        for (factor, value) in factors.components() {
            assert!(
                (0.0..=SCALE_MAX).contains(&value),
                "strain factor {factor} out of range: {value}"
            );
        }

        let weighted_strain = weights.sleep * factors.sleep
            + weights.load * factors.load
            + weights.recovery * factors.recovery
            + weights.stress * factors.stress;

        // Clamp shaves float dust from near-boundary weight sums
        (weighted_strain / SCALE_MAX).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factors(sleep: f64, load: f64, recovery: f64, stress: f64) -> NormalizedFactors {
        NormalizedFactors {
            sleep,
            load,
            recovery,
            stress,
        }
    }

    #[test]
    fn test_maximal_strain_scores_one_exactly() {
        let score = SaliCalculator::score(&factors(10.0, 10.0, 10.0, 10.0), &WeightVector::DEFAULT);
        assert_eq!(score, 1.0);
    }

    #[test]
    fn test_zero_strain_scores_zero_exactly() {
        let score = SaliCalculator::score(&factors(0.0, 0.0, 0.0, 0.0), &WeightVector::DEFAULT);
        assert_eq!(score, 0.0);
    }

    #[test]
    fn test_weighted_average() {
        let weights = WeightVector {
            sleep: 0.55,
            load: 0.15,
            recovery: 0.15,
            stress: 0.15,
        };
        let score = SaliCalculator::score(&factors(10.0, 2.0, 2.0, 2.0), &weights);
        // 0.55*10 + 0.15*(2+2+2) = 6.4
        assert!((score - 0.64).abs() < 1e-12);
    }

    #[test]
    fn test_equal_strain_matches_strain_fraction() {
        let score = SaliCalculator::score(&factors(2.0, 2.0, 2.0, 2.0), &WeightVector::DEFAULT);
        assert!((score - 0.2).abs() < 1e-12);
    }

    #[test]
    #[should_panic(expected = "sum-to-one")]
    fn test_invalid_weights_panic() {
        let weights = WeightVector {
            sleep: 0.5,
            load: 0.5,
            recovery: 0.5,
            stress: 0.5,
        };
        SaliCalculator::score(&factors(5.0, 5.0, 5.0, 5.0), &weights);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_out_of_range_factor_panics() {
        SaliCalculator::score(&factors(12.0, 5.0, 5.0, 5.0), &WeightVector::DEFAULT);
    }
}
