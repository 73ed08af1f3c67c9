//! # match_core - Deterministic Stochastic Match Simulation Engine
//!
//! Simulates head-to-head contests between two rated competitors as discrete
//! tick-by-tick Monte Carlo trials and aggregates batches of trials into
//! outcome probabilities and score distributions.
//!
//! ## Features
//! - Reproducible runs: same seed and run index give the same result, also
//!   under parallel execution
//! - Pluggable discipline through [`RatingModel`]; [`FootballRating`] by default
//! - Per-trial failure isolation and cooperative cancellation
//! - JSON API for transport-layer callers
//!
//! ```rust
//! use match_core::{simulate_batch, Competitor, MatchRequest};
//!
//! let request = MatchRequest::batch(
//!     Competitor::new("north", 1.2, 1.0),
//!     Competitor::new("south", 1.0, 1.0),
//!     500,
//! )
//! .with_seed(42);
//! let distribution = simulate_batch(&request).unwrap();
//! assert!((distribution.outcomes.total() - 1.0).abs() < 1e-9);
//! ```

pub mod api;
pub mod calibration;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;

pub use api::{engine_info, simulate_batch_json, simulate_json, EngineInfo};
pub use config::EngineConfig;
pub use engine::{
    CancellationToken, FootballRating, MatchEngine, RandomStream, RatingModel, ResultAggregator,
    SimulationRunner,
};
pub use error::{EngineError, Result, TrialFailure};
pub use models::{
    CardSeverity, Competitor, MatchDistribution, MatchEvent, MatchRequest, MatchResult,
    OutcomeClass, Side, TerminalReason, TimedEvent,
};

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const SCHEMA_VERSION: u8 = 1;

/// Single trial with the default configuration.
pub fn simulate(request: &MatchRequest) -> Result<MatchResult> {
    MatchEngine::new(EngineConfig::default())?.simulate(request)
}

/// Batch with the default configuration.
pub fn simulate_batch(request: &MatchRequest) -> Result<MatchDistribution> {
    MatchEngine::new(EngineConfig::default())?.simulate_batch(request)
}
