//! Batch scoring pipeline
//!
//! Orchestrates normalization, weight adaptation, scoring, conflict
//! detection and EMA smoothing over a date-ordered report sequence. The
//! pipeline is a single-threaded, synchronous, pure batch transform: all
//! history arrives in memory, nothing suspends or performs I/O, and all
//! state is threaded explicitly through inputs and outputs.
//!
//! Entries are derived cache, not a source of truth: when upstream reports
//! change (backfill, edits), the host discards previous outputs and reruns
//! the batch. Running twice over identical input yields identical output,
//! including weight-state dates, record ids and conflict detections.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ScoringConfig;
use crate::conflict::ConflictDetector;
use crate::ema::EmaSmoother;
use crate::error::ScoringError;
use crate::models::{
    record_id, ConflictPattern, DailyReport, SaliEntry, WeightState, WeightVector,
};
use crate::normalize::MetricNormalizer;
use crate::sali::SaliCalculator;
use crate::weights::{HistoryPoint, WeightAdapter};

/// A day the pipeline refused to score, with its reason.
///
/// Skipped days are surfaced to the caller rather than silently dropped;
/// one malformed historical day never blocks the rest of the range.
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedDay {
    pub date: chrono::NaiveDate,
    pub reason: ScoringError,
}

/// Complete output of one pipeline run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineOutput {
    /// One scored entry per accepted report, in chronological order
    pub entries: Vec<SaliEntry>,

    /// Weight states created during this run, in creation order
    pub weight_states: Vec<WeightState>,

    /// Conflicts detected during this run, in chronological order
    pub conflicts: Vec<ConflictPattern>,

    /// Days skipped with their reasons (not part of the serialized output)
    #[serde(skip)]
    pub skipped: Vec<SkippedDay>,
}

/// Orchestrator over the scoring components
pub struct ScoringPipeline {
    config: ScoringConfig,
    adapter: WeightAdapter,
    detector: ConflictDetector,
}

impl ScoringPipeline {
    pub fn new(config: ScoringConfig) -> Self {
        let adapter = WeightAdapter::new(config.clone());
        let detector = ConflictDetector::new(config.clone());
        ScoringPipeline {
            config,
            adapter,
            detector,
        }
    }

    /// Score a chronologically sorted report sequence.
    ///
    /// Preconditions: dates strictly increasing (the core never re-sorts;
    /// out-of-order or duplicate dates are a contract violation and fail the
    /// whole batch). Gaps between dates are fine — a missing date simply
    /// produces no entry. Empty input yields empty outputs, not an error.
    pub fn run(&self, reports: &[DailyReport]) -> Result<PipelineOutput, ScoringError> {
        Self::check_ordering(reports)?;

        let mut output = PipelineOutput::default();
        let mut history: Vec<HistoryPoint> = Vec::with_capacity(reports.len());
        let mut raw_series: Vec<f64> = Vec::with_capacity(reports.len());
        // (date, raw, weight_state_id) accumulated until the EMA pass
        let mut scored: Vec<(chrono::NaiveDate, f64, Option<uuid::Uuid>)> =
            Vec::with_capacity(reports.len());
        let mut current_state: Option<WeightState> = None;
        let mut conflicts_since_recompute = 0usize;

        for report in reports {
            let factors = match MetricNormalizer::normalize(report) {
                Ok(factors) => factors,
                Err(reason) => {
                    warn!(date = %report.date, %reason, "skipping day");
                    output.skipped.push(SkippedDay {
                        date: report.date,
                        reason,
                    });
                    continue;
                }
            };

            history.push(HistoryPoint {
                date: report.date,
                factors,
                energy: report.energy_level,
            });

            // Weight adaptation sees data up to and including today only
            match self.adapter.maybe_recompute(
                &history,
                current_state.as_ref(),
                conflicts_since_recompute,
            ) {
                Ok(Some(state)) => {
                    output.weight_states.push(state.clone());
                    current_state = Some(state);
                    conflicts_since_recompute = 0;
                }
                Ok(None) => {}
                Err(err @ ScoringError::InsufficientHistory { .. }) => {
                    debug!(date = %report.date, %err, "using default weights");
                }
                Err(err) => return Err(err),
            }

            let (weights, weight_state_id) = match &current_state {
                Some(state) => (state.weights, Some(state.id)),
                None => (WeightVector::DEFAULT, None),
            };

            let raw = SaliCalculator::score(&factors, &weights);
            raw_series.push(raw);
            scored.push((report.date, raw, weight_state_id));

            if let Some(conflict) =
                self.detector
                    .detect(report.date, &factors, &weights, report.energy_level, raw)
            {
                debug!(
                    date = %report.date,
                    conflict_type = %conflict.conflict_type,
                    magnitude = conflict.magnitude,
                    "conflict detected"
                );
                output.conflicts.push(conflict);
                conflicts_since_recompute += 1;
            }
        }

        // EMAs are a pure function of the full raw series, recomputed in
        // chronological order after the pass
        let trends = EmaSmoother::smooth_pair(
            &raw_series,
            self.config.ema_fast_span,
            self.config.ema_slow_span,
        );

        output.entries = scored
            .into_iter()
            .zip(trends)
            .map(|((date, raw, weight_state_id), (ema7, ema28))| SaliEntry {
                id: record_id(&format!("sali:{date}")),
                date,
                raw_sali: raw,
                sali_ema7: ema7,
                sali_ema28: ema28,
                weight_state_id,
            })
            .collect();

        Ok(output)
    }

    fn check_ordering(reports: &[DailyReport]) -> Result<(), ScoringError> {
        for pair in reports.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(ScoringError::UnsortedInput {
                    previous: pair[0].date,
                    current: pair[1].date,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Days::new(n)
    }

    fn steady_report(date: NaiveDate) -> DailyReport {
        DailyReport {
            date,
            sleep_recovery: 8.0,
            physical_load: 2.0,
            recovery_from_load: 8.0,
            psychological_stress: 2.0,
            energy_level: 8.0,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let output = pipeline.run(&[]).unwrap();
        assert!(output.entries.is_empty());
        assert!(output.weight_states.is_empty());
        assert!(output.conflicts.is_empty());
        assert!(output.skipped.is_empty());
    }

    #[test]
    fn test_unsorted_input_fails_batch() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let reports = vec![steady_report(date(1)), steady_report(date(0))];
        let err = pipeline.run(&reports).unwrap_err();
        assert!(matches!(err, ScoringError::UnsortedInput { .. }));
    }

    #[test]
    fn test_duplicate_date_fails_batch() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let reports = vec![steady_report(date(0)), steady_report(date(0))];
        assert!(pipeline.run(&reports).is_err());
    }

    #[test]
    fn test_out_of_range_day_is_skipped_not_fatal() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let mut reports: Vec<DailyReport> = (0..5).map(|i| steady_report(date(i))).collect();
        reports[2].physical_load = 42.0;

        let output = pipeline.run(&reports).unwrap();
        assert_eq!(output.entries.len(), 4);
        assert_eq!(output.skipped.len(), 1);
        assert_eq!(output.skipped[0].date, date(2));
        assert!(matches!(
            output.skipped[0].reason,
            ScoringError::OutOfRangeInput {
                field: "physical_load",
                ..
            }
        ));
        // The skipped date never produced an entry
        assert!(output.entries.iter().all(|e| e.date != date(2)));
    }

    #[test]
    fn test_entries_are_strictly_increasing_by_date() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let reports: Vec<DailyReport> = (0..20).map(|i| steady_report(date(i * 2))).collect();
        let output = pipeline.run(&reports).unwrap();
        for pair in output.entries.windows(2) {
            assert!(pair[1].date > pair[0].date);
        }
    }

    #[test]
    fn test_default_weights_until_minimum_history() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let reports: Vec<DailyReport> = (0..20).map(|i| steady_report(date(i))).collect();
        let output = pipeline.run(&reports).unwrap();

        // First weight state appears on day 14 (index 13)
        assert_eq!(output.weight_states.len(), 1);
        assert_eq!(output.weight_states[0].calculated_on, date(13));
        for entry in &output.entries[..13] {
            assert!(entry.weight_state_id.is_none());
        }
        for entry in &output.entries[13..] {
            assert_eq!(entry.weight_state_id, Some(output.weight_states[0].id));
        }
    }

    #[test]
    fn test_no_lookahead_in_weight_application() {
        let pipeline = ScoringPipeline::new(ScoringConfig::default());
        let reports: Vec<DailyReport> = (0..30).map(|i| steady_report(date(i))).collect();
        let output = pipeline.run(&reports).unwrap();

        let state = &output.weight_states[0];
        for entry in &output.entries {
            match entry.weight_state_id {
                Some(_) => assert!(entry.date >= state.calculated_on),
                None => assert!(entry.date < state.calculated_on),
            }
        }
    }
}
