pub mod aggregator;
pub mod generator;
pub mod random;
pub mod rating;
pub mod runner;
pub mod state_machine;

pub use aggregator::{ResultAggregator, RunningStats};
pub use generator::{Draw, EventGenerator};
pub use random::RandomStream;
pub use rating::{EventProbabilities, FootballRating, RatingModel};
pub use runner::{BatchOutcome, BatchPlan, CancellationToken, SimulationRunner};
pub use state_machine::{ActiveModifier, MatchState, MatchStateMachine, Phase};

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::models::{MatchDistribution, MatchRequest, MatchResult};

/// Entry point tying the runner and aggregator to one configuration.
///
/// The worker pool is built once here and reused across calls.
pub struct MatchEngine<M: RatingModel = FootballRating> {
    config: EngineConfig,
    runner: SimulationRunner<M>,
}

impl MatchEngine<FootballRating> {
    pub fn new(config: EngineConfig) -> Result<Self> {
        let model = FootballRating::new(config.rating.clone());
        Self::with_model(config, model)
    }
}

impl<M: RatingModel> MatchEngine<M> {
    pub fn with_model(config: EngineConfig, model: M) -> Result<Self> {
        config.validate()?;
        let runner = SimulationRunner::with_model(&config, model)?;
        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn runner(&self) -> &SimulationRunner<M> {
        &self.runner
    }

    /// Play one trial (run index 0) with its full tick-by-tick timeline.
    pub fn simulate(&self, request: &MatchRequest) -> Result<MatchResult> {
        if request.trials != 1 {
            return Err(EngineError::Configuration(format!(
                "simulate plays exactly one trial, got trials = {}",
                request.trials
            )));
        }
        let plan = BatchPlan::from_request(request, &self.config)?;
        let result = self.runner.run_single(&plan, 0, &CancellationToken::new());
        tracing::debug!(
            seed = plan.seed,
            score_a = result.score_a,
            score_b = result.score_b,
            "single trial finished"
        );
        Ok(result)
    }

    pub fn simulate_batch(&self, request: &MatchRequest) -> Result<MatchDistribution> {
        self.simulate_batch_with_cancel(request, &CancellationToken::new())
    }

    /// Run a batch that stops early once `token` trips.
    ///
    /// Cancellation is not an error: the distribution covers the trials that
    /// completed and is flagged `partial`. A failure rate above the configured
    /// threshold is surfaced as [`EngineError::SystemicFailure`].
    pub fn simulate_batch_with_cancel(
        &self,
        request: &MatchRequest,
        token: &CancellationToken,
    ) -> Result<MatchDistribution> {
        let plan = BatchPlan::from_request(request, &self.config)?;
        let span = tracing::info_span!("simulate_batch", seed = plan.seed, trials = plan.trials);
        let _guard = span.enter();

        let outcome = self.execute(&plan, token);
        let distribution = ResultAggregator::reduce(&outcome.results)
            .finish(outcome.results.len() as u64, outcome.seed);

        tracing::info!(
            completed = distribution.completed_trials,
            failed = distribution.failed_trials,
            cancelled = distribution.cancelled_trials,
            elapsed_ms = outcome.elapsed.as_millis() as u64,
            "batch aggregated"
        );
        if distribution.data_quality_warnings > 0 {
            tracing::warn!(
                ticks = distribution.data_quality_warnings,
                "event probabilities summed above one and were renormalized"
            );
        }
        if distribution.partial {
            tracing::warn!(
                completed = distribution.completed_trials,
                requested = distribution.requested_trials,
                "batch cancelled, returning partial distribution"
            );
        }

        let threshold = self.config.runner.failure_threshold;
        if distribution.failed_trials > 0 && distribution.failure_rate() > threshold {
            let failed = distribution.failed_trials;
            let total = distribution.completed_trials + failed;
            tracing::error!(failed, total, threshold, "trial failure rate above threshold");
            return Err(EngineError::SystemicFailure { failed, total, threshold });
        }
        Ok(distribution)
    }

    /// Raw per-trial results of a batch, in run-index order.
    pub fn run_trials(
        &self,
        request: &MatchRequest,
        token: &CancellationToken,
    ) -> Result<BatchOutcome> {
        let plan = BatchPlan::from_request(request, &self.config)?;
        let span = tracing::info_span!("run_trials", seed = plan.seed, trials = plan.trials);
        let _guard = span.enter();
        Ok(self.execute(&plan, token))
    }

    fn execute(&self, plan: &BatchPlan, token: &CancellationToken) -> BatchOutcome {
        tracing::info!(
            workers = self.runner.workers(),
            match_length = plan.match_length,
            model = self.runner.model().name(),
            "batch started"
        );
        self.runner.run(plan, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Competitor;

    fn request(trials: u32) -> MatchRequest {
        MatchRequest::batch(Competitor::new("a", 1.2, 1.0), Competitor::new("b", 1.0, 1.0), trials)
            .with_seed(42)
    }

    fn engine() -> MatchEngine {
        MatchEngine::new(EngineConfig::testing()).unwrap()
    }

    #[test]
    fn test_simulate_rejects_batch_request() {
        let err = engine().simulate(&request(5)).unwrap_err();
        assert!(matches!(err, EngineError::Configuration(_)));
    }

    #[test]
    fn test_simulate_keeps_full_timeline() {
        let result = engine().simulate(&request(1)).unwrap();
        assert!(result.is_completed());
        assert_eq!(result.timeline.len(), 90);
        assert_eq!(result.run_index, 0);
        assert_eq!(result.seed, 42);
    }

    #[test]
    fn test_simulate_deterministic() {
        let e = engine();
        assert_eq!(e.simulate(&request(1)).unwrap(), e.simulate(&request(1)).unwrap());
    }

    #[test]
    fn test_batch_counts_add_up() {
        let d = engine().simulate_batch(&request(500)).unwrap();
        assert_eq!(d.requested_trials, 500);
        assert_eq!(d.completed_trials + d.failed_trials + d.cancelled_trials, 500);
        assert_eq!(d.seed, 42);
        assert!((d.outcomes.total() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_trials_rejected_before_work() {
        let mut req = request(1);
        req.trials = 0;
        assert!(engine().simulate_batch(&req).is_err());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = EngineConfig::default();
        config.runner.failure_threshold = 2.0;
        assert!(MatchEngine::new(config).is_err());
    }

    #[test]
    fn test_missing_seed_reported() {
        let req = MatchRequest::batch(Competitor::new("a", 1.0, 1.0), Competitor::new("b", 1.0, 1.0), 20);
        let e = engine();
        let first = e.simulate_batch(&req).unwrap();
        let replay = e.simulate_batch(&req.clone().with_seed(first.seed)).unwrap();
        assert_eq!(first, replay);
    }

    #[test]
    fn test_cancelled_batch_is_partial_not_error() {
        let token = CancellationToken::new();
        token.cancel();
        let d = engine().simulate_batch_with_cancel(&request(50), &token).unwrap();
        assert!(d.partial);
        assert!(d.insufficient_data);
        assert_eq!(d.cancelled_trials, 50);
    }
}
