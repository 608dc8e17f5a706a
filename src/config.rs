use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Tunable constants of the scoring core.
///
/// The defaults are design choices validated against the property tests,
/// not protocol constants; hosts may override them from a TOML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringConfig {
    /// Minimum days of history before weights adapt (default: 14)
    pub min_history_days: usize,

    /// Calendar days between scheduled weight recomputations (default: 28)
    pub recompute_interval_days: i64,

    /// Conflicts since the last recomputation that force an early one
    /// (default: 3)
    pub conflict_recompute_count: usize,

    /// Maximum days in the correlation window (default: 90)
    pub correlation_window_days: usize,

    /// Minimum weight per factor after adaptation (default: 0.05)
    pub weight_floor: f64,

    /// Implied-vs-actual energy deviation that triggers a conflict
    /// (default: 2.5)
    pub conflict_threshold: f64,

    /// Share of total weighted strain a single factor must reach to be
    /// named in a conflict classification (default: 0.40)
    pub dominance_share: f64,

    /// Fast EMA span in days (default: 7)
    pub ema_fast_span: usize,

    /// Slow EMA span in days (default: 28)
    pub ema_slow_span: usize,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        ScoringConfig {
            min_history_days: 14,
            recompute_interval_days: 28,
            conflict_recompute_count: 3,
            correlation_window_days: 90,
            weight_floor: 0.05,
            conflict_threshold: 2.5,
            dominance_share: 0.40,
            ema_fast_span: 7,
            ema_slow_span: 28,
        }
    }
}

impl ScoringConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref()).with_context(|| {
            format!("Failed to read config file: {}", path.as_ref().display())
        })?;
        let config: ScoringConfig = toml::from_str(&content).with_context(|| {
            format!("Failed to parse config file: {}", path.as_ref().display())
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the given path, or from the default location if present,
    /// falling back to defaults otherwise
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => {
                let default_path = Self::default_config_path()?;
                if default_path.exists() {
                    Self::load(default_path)
                } else {
                    Ok(ScoringConfig::default())
                }
            }
        }
    }

    /// Default config location: `<config_dir>/allostat/config.toml`
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Could not determine config directory")?;
        Ok(config_dir.join("allostat").join("config.toml"))
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path.as_ref(), content).with_context(|| {
            format!("Failed to write config file: {}", path.as_ref().display())
        })?;
        Ok(())
    }

    /// Reject configurations that would break the scoring invariants
    pub fn validate(&self) -> Result<()> {
        if self.min_history_days < 2 {
            anyhow::bail!("min_history_days must be at least 2 (correlation needs variance)");
        }
        if self.weight_floor < 0.0 || self.weight_floor * 4.0 > 1.0 {
            anyhow::bail!("weight_floor must lie in [0, 0.25] so four floors fit in a unit sum");
        }
        if self.conflict_threshold <= 0.0 || self.conflict_threshold > 10.0 {
            anyhow::bail!("conflict_threshold must lie in (0, 10]");
        }
        if !(0.0..=1.0).contains(&self.dominance_share) {
            anyhow::bail!("dominance_share must lie in [0, 1]");
        }
        if self.ema_fast_span == 0 || self.ema_slow_span == 0 {
            anyhow::bail!("EMA spans must be positive");
        }
        if self.correlation_window_days < self.min_history_days {
            anyhow::bail!("correlation_window_days must cover at least min_history_days");
        }
        Ok(())
    }
}
