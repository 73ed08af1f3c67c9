use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Hard errors surfaced to the caller of the engine.
///
/// Trial-level problems never show up here; they travel as data inside
/// [`crate::models::MatchResult`] and the failed-trial counters of a
/// [`crate::models::MatchDistribution`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Request validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Systemic failure: {failed} of {total} trials failed (threshold {threshold:.3})")]
    SystemicFailure { failed: u64, total: u64, threshold: f64 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config file error: {0}")]
    ConfigIo(#[from] std::io::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] serde_yaml::Error),
}

impl EngineError {
    /// Whether resubmitting a corrected request can succeed.
    ///
    /// Systemic failures are deterministic for a given request and model, so
    /// resubmitting the same input reproduces them.
    pub fn is_recoverable(&self) -> bool {
        match self {
            EngineError::Configuration(_) => true,
            EngineError::Validation(_) => true,
            EngineError::ConfigIo(_) => true,
            EngineError::SystemicFailure { .. } => false,
            EngineError::Serialization(_) => false,
            EngineError::ConfigParse(_) => false,
        }
    }
}

/// Fatal invariant violation inside a single trial.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum TrialFailure {
    #[error("rating model produced invalid probabilities at tick {tick}: {detail}")]
    InvalidProbabilities { tick: u32, detail: String },

    #[error("event applied after terminal state at tick {tick}")]
    EventAfterTerminal { tick: u32 },

    #[error("event tick {got} does not follow tick {current}")]
    TickOutOfOrder { current: u32, got: u32 },

    #[error("score overflow at tick {tick}")]
    ScoreOverflow { tick: u32 },

    #[error("trial panicked: {0}")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
