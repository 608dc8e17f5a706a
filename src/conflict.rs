//! Conflict-pattern detection
//!
//! Compares the weighted model's implied energy against the energy the user
//! actually reported. A large gap means the learned weights and the day's
//! factors fail to explain the anchor signal; the detector classifies which
//! factor is implicated and emits a structured record for insight surfaces.

use chrono::NaiveDate;

use crate::config::ScoringConfig;
use crate::models::{ConflictPattern, ConflictType, Factor, NormalizedFactors, WeightVector};
use crate::normalize::SCALE_MAX;

/// Stateless implied-vs-actual energy comparator
pub struct ConflictDetector {
    config: ScoringConfig,
}

impl ConflictDetector {
    pub fn new(config: ScoringConfig) -> Self {
        ConflictDetector { config }
    }

    /// Detect a conflict for one day's already-computed values.
    ///
    /// Implied energy is `10 - raw_sali * 10`, the model's prediction given
    /// the weighted strain. Deviations under the threshold are routine
    /// day-to-day noise and yield `None`.
    pub fn detect(
        &self,
        date: NaiveDate,
        factors: &NormalizedFactors,
        weights: &WeightVector,
        actual_energy: f64,
        raw_sali: f64,
    ) -> Option<ConflictPattern> {
        let implied_energy = SCALE_MAX - raw_sali * SCALE_MAX;
        let magnitude = (implied_energy - actual_energy).abs();
        if magnitude < self.config.conflict_threshold {
            return None;
        }

        let (conflict_type, dominant) = self.classify(factors, weights);
        let pattern = Self::describe(dominant, factors, implied_energy, actual_energy);

        Some(ConflictPattern::new(date, conflict_type, pattern, magnitude))
    }

    /// Attribute the discrepancy to the factor carrying the largest share of
    /// the weighted strain. Below the dominance share, or with zero total
    /// strain, no single factor explains the gap.
    fn classify(
        &self,
        factors: &NormalizedFactors,
        weights: &WeightVector,
    ) -> (ConflictType, Option<Factor>) {
        let contributions: Vec<(Factor, f64)> = factors
            .components()
            .iter()
            .zip(weights.components())
            .map(|(&(factor, value), (_, weight))| (factor, weight * value))
            .collect();

        let total: f64 = contributions.iter().map(|(_, c)| c).sum();
        if total <= 0.0 {
            return (ConflictType::UnexplainedDeviation, None);
        }

        let (dominant, largest) = contributions
            .iter()
            .copied()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .expect("contributions are non-empty");

        if largest / total < self.config.dominance_share {
            return (ConflictType::UnexplainedDeviation, None);
        }

        let conflict_type = match dominant {
            Factor::Sleep => ConflictType::SleepEnergyMismatch,
            Factor::Stress => ConflictType::StressEnergyMismatch,
            Factor::Load | Factor::Recovery => ConflictType::LoadRecoveryMismatch,
        };
        (conflict_type, Some(dominant))
    }

    fn describe(
        dominant: Option<Factor>,
        factors: &NormalizedFactors,
        implied_energy: f64,
        actual_energy: f64,
    ) -> String {
        let direction = if actual_energy > implied_energy {
            "above"
        } else {
            "below"
        };
        match dominant {
            Some(factor) => {
                let strain = factors
                    .components()
                    .iter()
                    .find(|(f, _)| *f == factor)
                    .map(|(_, v)| *v)
                    .unwrap_or(0.0);
                format!(
                    "{factor} strain {strain:.1} implies energy {implied_energy:.1}, \
                     reported {actual_energy:.1} ({direction} model)"
                )
            }
            None => format!(
                "no dominant factor; implied energy {implied_energy:.1}, \
                 reported {actual_energy:.1} ({direction} model)"
            ),
        }
    }
}
