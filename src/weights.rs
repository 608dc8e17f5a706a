//! Adaptive per-factor weighting
//!
//! Maintains the per-factor weights that best explain variation in the
//! reported energy anchor over a rolling history window. Weights are
//! recomputed periodically rather than on every entry: on first fit once
//! enough history exists, on a fixed calendar cadence, and early when the
//! conflict detector keeps flagging sustained model mismatch.
//!
//! Each factor is weighted by the magnitude of its Pearson correlation with
//! the inverted energy series (higher strain should predict lower energy),
//! floored so no factor can decay to zero weight on transient decorrelation.

use chrono::NaiveDate;
use statrs::statistics::Statistics;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::error::ScoringError;
use crate::models::{Factor, NormalizedFactors, SourceRange, WeightState, WeightVector};
use crate::normalize::SCALE_MAX;

/// One scored day of history as the adapter sees it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub factors: NormalizedFactors,
    pub energy: f64,
}

/// Rolling-correlation weight adapter
pub struct WeightAdapter {
    config: ScoringConfig,
}

impl WeightAdapter {
    pub fn new(config: ScoringConfig) -> Self {
        WeightAdapter { config }
    }

    /// Decide whether the weights need recomputing as of the newest history
    /// day, and recompute them if so.
    ///
    /// `history` is the chronologically ordered sequence of normalized days
    /// up to and including the day being scored (never beyond it — the
    /// pipeline guarantees no look-ahead). `conflicts_since_last` counts
    /// conflicts flagged since the last recomputation.
    ///
    /// Returns `Ok(None)` when no trigger fired, and
    /// `Err(InsufficientHistory)` when fewer than the minimum days exist;
    /// the caller falls back to the equal-weight default, which is never
    /// persisted as a WeightState.
    pub fn maybe_recompute(
        &self,
        history: &[HistoryPoint],
        last_state: Option<&WeightState>,
        conflicts_since_last: usize,
    ) -> Result<Option<WeightState>, ScoringError> {
        let available = history.len();
        if available < self.config.min_history_days {
            return Err(ScoringError::InsufficientHistory {
                available,
                required: self.config.min_history_days,
            });
        }

        let current_date = history[available - 1].date;
        let triggered = match last_state {
            None => true,
            Some(state) => {
                let elapsed = (current_date - state.calculated_on).num_days();
                elapsed >= self.config.recompute_interval_days
                    || conflicts_since_last >= self.config.conflict_recompute_count
            }
        };

        if !triggered {
            return Ok(None);
        }

        Ok(Some(self.recompute(history, current_date)))
    }

    /// Recompute weights over the most recent `min(window, len)` days.
    fn recompute(&self, history: &[HistoryPoint], calculated_on: NaiveDate) -> WeightState {
        let window_size = self.config.correlation_window_days.min(history.len());
        let window = &history[history.len() - window_size..];

        // Higher strain should predict lower energy, so correlate against
        // the inverted anchor.
        let inverted_energy: Vec<f64> = window.iter().map(|d| SCALE_MAX - d.energy).collect();

        let magnitudes = [
            (
                Factor::Sleep,
                self.correlation_magnitude(
                    Factor::Sleep,
                    &window.iter().map(|d| d.factors.sleep).collect::<Vec<_>>(),
                    &inverted_energy,
                ),
            ),
            (
                Factor::Load,
                self.correlation_magnitude(
                    Factor::Load,
                    &window.iter().map(|d| d.factors.load).collect::<Vec<_>>(),
                    &inverted_energy,
                ),
            ),
            (
                Factor::Recovery,
                self.correlation_magnitude(
                    Factor::Recovery,
                    &window.iter().map(|d| d.factors.recovery).collect::<Vec<_>>(),
                    &inverted_energy,
                ),
            ),
            (
                Factor::Stress,
                self.correlation_magnitude(
                    Factor::Stress,
                    &window.iter().map(|d| d.factors.stress).collect::<Vec<_>>(),
                    &inverted_energy,
                ),
            ),
        ];

        let weights = self.build_weights(&magnitudes);
        assert!(
            weights.is_valid(),
            "adapted weights violate sum-to-one contract: {weights:?}"
        );

        let source_range = SourceRange {
            first: window[0].date,
            last: window[window.len() - 1].date,
        };

        debug!(
            date = %calculated_on,
            window = window_size,
            sleep = weights.sleep,
            load = weights.load,
            recovery = weights.recovery,
            stress = weights.stress,
            "recomputed factor weights"
        );

        WeightState::new(calculated_on, weights, window_size, source_range)
    }

    /// |Pearson r| of a factor strain series against the inverted energy
    /// series. A zero-variance series on either side makes the correlation
    /// undefined; the factor then contributes only its floor weight.
    fn correlation_magnitude(&self, factor: Factor, xs: &[f64], ys: &[f64]) -> f64 {
        match Self::pearson(factor, xs, ys) {
            Ok(r) => r.abs(),
            Err(err) => {
                debug!(%factor, %err, "treating correlation as zero");
                0.0
            }
        }
    }

    fn pearson(factor: Factor, xs: &[f64], ys: &[f64]) -> Result<f64, ScoringError> {
        debug_assert_eq!(xs.len(), ys.len());
        let sx = xs.std_dev();
        let sy = ys.std_dev();
        if sx == 0.0 || sy == 0.0 || !sx.is_finite() || !sy.is_finite() {
            return Err(ScoringError::DegenerateCorrelation { factor });
        }
        Ok(xs.covariance(ys) / (sx * sy))
    }

    /// Distribute weight proportionally to correlation magnitude on top of a
    /// per-factor floor. The floor-plus-remainder construction guarantees
    /// both invariants (sum = 1.0, each component >= floor) in one step.
    fn build_weights(&self, magnitudes: &[(Factor, f64); 4]) -> WeightVector {
        let floor = self.config.weight_floor;
        let distributable = 1.0 - 4.0 * floor;
        let total: f64 = magnitudes.iter().map(|(_, m)| m).sum();

        let share = |factor: Factor| -> f64 {
            let magnitude = magnitudes
                .iter()
                .find(|(f, _)| *f == factor)
                .map(|(_, m)| *m)
                .unwrap_or(0.0);
            if total > 0.0 {
                magnitude / total
            } else {
                // All factors decorrelated: fall back to equal shares
                0.25
            }
        };

        WeightVector {
            sleep: floor + distributable * share(Factor::Sleep),
            load: floor + distributable * share(Factor::Load),
            recovery: floor + distributable * share(Factor::Recovery),
            stress: floor + distributable * share(Factor::Stress),
        }
    }
}
