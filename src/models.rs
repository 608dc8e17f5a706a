use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Namespace used to derive record ids (UUIDv5) from canonical strings.
///
/// Deterministic ids keep pipeline reruns byte-identical: the same input
/// history always yields the same WeightState, SaliEntry and ConflictPattern
/// ids, so derived records can be diffed or replaced wholesale.
pub const ID_NAMESPACE: Uuid = Uuid::from_u128(0x5a11_0a7e_ad00_4c3b_9f21_6e84_23d1_77c5);

/// Derive a deterministic record id from a canonical name.
pub fn record_id(name: &str) -> Uuid {
    Uuid::new_v5(&ID_NAMESPACE, name.as_bytes())
}

/// One self-report per calendar date. All metrics are on a 0-10 scale as
/// entered by the user; upsert semantics for duplicate dates belong to the
/// external store, not this core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyReport {
    /// Date the report covers
    pub date: NaiveDate,

    /// How well sleep restored the user (10 = fully restored)
    pub sleep_recovery: f64,

    /// Physical load incurred during the day (10 = maximal load)
    pub physical_load: f64,

    /// How well the user recovered from recent load (10 = fully recovered)
    pub recovery_from_load: f64,

    /// Psychological stress level (10 = maximal stress)
    pub psychological_stress: f64,

    /// Reported energy level, the anchor signal (10 = full energy)
    pub energy_level: f64,
}

/// The four contributing metrics of a report, identified by name.
///
/// Used in error reporting and conflict classification so that a factor is
/// always referred to by a fixed identifier rather than a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Factor {
    Sleep,
    Load,
    Recovery,
    Stress,
}

impl fmt::Display for Factor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Factor::Sleep => write!(f, "sleep"),
            Factor::Load => write!(f, "load"),
            Factor::Recovery => write!(f, "recovery"),
            Factor::Stress => write!(f, "stress"),
        }
    }
}

/// A report's four factors mapped onto a common strain scale.
///
/// All values lie in [0,10] with a single polarity: higher always means more
/// allostatic strain. The fields are fixed and named so the polarity flips in
/// the normalizer are checked at compile time, not by map keys.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalizedFactors {
    /// Strain from poor sleep recovery (inverted sleep_recovery)
    pub sleep: f64,

    /// Strain from physical load (used directly)
    pub load: f64,

    /// Strain from incomplete recovery (inverted recovery_from_load)
    pub recovery: f64,

    /// Strain from psychological stress (used directly)
    pub stress: f64,
}

impl NormalizedFactors {
    /// Factor values paired with their identifiers, in canonical order.
    pub fn components(&self) -> [(Factor, f64); 4] {
        [
            (Factor::Sleep, self.sleep),
            (Factor::Load, self.load),
            (Factor::Recovery, self.recovery),
            (Factor::Stress, self.stress),
        ]
    }
}

/// Per-factor importance weights. Non-negative, sum to 1.0 within 1e-6.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector {
    pub sleep: f64,
    pub load: f64,
    pub recovery: f64,
    pub stress: f64,
}

/// Tolerance for the sum-to-one weight invariant.
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

impl WeightVector {
    /// Equal weighting used until enough history exists to adapt.
    /// Never persisted as a WeightState.
    pub const DEFAULT: WeightVector = WeightVector {
        sleep: 0.25,
        load: 0.25,
        recovery: 0.25,
        stress: 0.25,
    };

    pub fn sum(&self) -> f64 {
        self.sleep + self.load + self.recovery + self.stress
    }

    /// Check the sum-to-one and non-negativity invariants.
    pub fn is_valid(&self) -> bool {
        let non_negative =
            self.sleep >= 0.0 && self.load >= 0.0 && self.recovery >= 0.0 && self.stress >= 0.0;
        non_negative && (self.sum() - 1.0).abs() <= WEIGHT_SUM_TOLERANCE
    }

    /// Weight values paired with their factor identifiers, in canonical order.
    pub fn components(&self) -> [(Factor, f64); 4] {
        [
            (Factor::Sleep, self.sleep),
            (Factor::Load, self.load),
            (Factor::Recovery, self.recovery),
            (Factor::Stress, self.stress),
        ]
    }
}

impl Default for WeightVector {
    fn default() -> Self {
        WeightVector::DEFAULT
    }
}

/// First and last report dates of the history window a WeightState was
/// computed from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SourceRange {
    pub first: NaiveDate,
    pub last: NaiveDate,
}

/// A snapshot of adapted per-factor weights, valid from `calculated_on`
/// until superseded by a later state. Immutable once created.
///
/// `calculated_on` is the report date whose processing triggered the
/// recomputation, not wall-clock time, so reruns over identical input
/// reproduce identical states.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightState {
    pub id: Uuid,

    /// Report date that triggered this recomputation
    pub calculated_on: NaiveDate,

    pub weights: WeightVector,

    /// Number of days in the correlation window
    pub window_size: usize,

    /// First/last report dates in the correlation window
    pub source_range: SourceRange,
}

impl WeightState {
    /// Build a state with a deterministic id derived from its window.
    pub fn new(
        calculated_on: NaiveDate,
        weights: WeightVector,
        window_size: usize,
        source_range: SourceRange,
    ) -> Self {
        let id = record_id(&format!("weight-state:{}:{}", calculated_on, window_size));
        WeightState {
            id,
            calculated_on,
            weights,
            window_size,
            source_range,
        }
    }
}

/// One computed Allostatic Load Index record per scored date.
///
/// Entries are derived outputs of (report history, weight-state history):
/// a cache, not a source of truth. Hosts discard and re-derive them in full
/// whenever upstream data changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaliEntry {
    pub id: Uuid,

    pub date: NaiveDate,

    /// Raw weighted strain for the day, in [0,1]
    pub raw_sali: f64,

    /// Fast trend: EMA of raw_sali with span 7
    pub sali_ema7: f64,

    /// Slow trend: EMA of raw_sali with span 28
    pub sali_ema28: f64,

    /// WeightState that produced this entry; None while the transient
    /// equal-weight default was in use
    pub weight_state_id: Option<Uuid>,
}

/// Categories of disagreement between the weighted model's implied energy
/// and the user's reported energy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictType {
    /// Sleep strain dominates the discrepancy
    SleepEnergyMismatch,
    /// Stress strain dominates the discrepancy
    StressEnergyMismatch,
    /// Physical load or recovery strain dominates the discrepancy
    LoadRecoveryMismatch,
    /// No single factor reaches the dominance share
    UnexplainedDeviation,
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::SleepEnergyMismatch => write!(f, "sleep-energy-mismatch"),
            ConflictType::StressEnergyMismatch => write!(f, "stress-energy-mismatch"),
            ConflictType::LoadRecoveryMismatch => write!(f, "load-recovery-mismatch"),
            ConflictType::UnexplainedDeviation => write!(f, "unexplained-deviation"),
        }
    }
}

/// A detected disagreement between implied and reported energy for one day.
/// Never mutated; superseded by a corrected detection if upstream data
/// changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConflictPattern {
    pub id: Uuid,

    pub date: NaiveDate,

    pub conflict_type: ConflictType,

    /// Human-readable descriptor of which factors and directions conflicted
    pub pattern: String,

    /// Absolute implied-vs-actual energy deviation that triggered detection
    pub magnitude: f64,

    /// Report date of the detection (determinism: never wall-clock)
    pub detected_on: NaiveDate,
}

impl ConflictPattern {
    pub fn new(
        date: NaiveDate,
        conflict_type: ConflictType,
        pattern: String,
        magnitude: f64,
    ) -> Self {
        let id = record_id(&format!("conflict:{}:{}", date, conflict_type));
        ConflictPattern {
            id,
            date,
            conflict_type,
            pattern,
            magnitude,
            detected_on: date,
        }
    }
}
