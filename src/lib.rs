// Library interface for the allostat scoring core
// This allows integration tests to access the core functionality

pub mod config;
pub mod conflict;
pub mod ema;
pub mod error;
pub mod import;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod sali;
pub mod weights;

// Re-export commonly used types for convenience
pub use config::ScoringConfig;
pub use conflict::ConflictDetector;
pub use ema::EmaSmoother;
pub use error::{AllostatError, Result, ScoringError};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use models::{
    ConflictPattern, ConflictType, DailyReport, Factor, NormalizedFactors, SaliEntry, SourceRange,
    WeightState, WeightVector,
};
pub use normalize::MetricNormalizer;
pub use pipeline::{PipelineOutput, ScoringPipeline, SkippedDay};
pub use sali::SaliCalculator;
pub use weights::{HistoryPoint, WeightAdapter};
