//! Batch runner
//!
//! Trials are independent: each derives its own [`RandomStream`] from the
//! batch seed and its run index and owns its [`MatchStateMachine`]. A fixed
//! rayon pool maps the index range and writes each result straight into the
//! output slot for that index, so the output order is the run-index order
//! whatever the scheduling.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};

use super::generator::EventGenerator;
use super::random::RandomStream;
use super::rating::{FootballRating, RatingModel};
use super::state_machine::{MatchStateMachine, Phase};
use crate::config::{CardRules, EngineConfig, RunnerConfig, TimelineDetail};
use crate::error::{EngineError, Result, TrialFailure};
use crate::models::{Competitor, MatchRequest, MatchResult, TerminalReason, TimedEvent};

// ============================================================================
// Cancellation
// ============================================================================

/// Cooperative cancellation signal shared between a caller and a batch.
///
/// Trials poll it at tick boundaries. Clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenInner>,
}

#[derive(Debug, Default)]
struct TokenInner {
    cancelled: AtomicBool,
    deadline: Option<Instant>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that trips on its own once `timeout` has elapsed.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(TokenInner {
                cancelled: AtomicBool::new(false),
                deadline: Some(Instant::now() + timeout),
            }),
        }
    }

    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        match self.inner.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                self.cancel();
                true
            }
            _ => false,
        }
    }
}

// ============================================================================
// Batch plan
// ============================================================================

/// A request with defaults filled in and attributes clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchPlan {
    pub competitor_a: Competitor,
    pub competitor_b: Competitor,
    pub trials: u64,
    pub seed: u64,
    pub match_length: u32,
}

impl BatchPlan {
    /// Validate `request` and resolve it against `config`.
    ///
    /// A missing seed is drawn from OS entropy and kept in the plan, so the
    /// batch can still be replayed from its reported seed.
    pub fn from_request(request: &MatchRequest, config: &EngineConfig) -> Result<Self> {
        request.check()?;
        Ok(Self {
            competitor_a: request.competitor_a.clamped(),
            competitor_b: request.competitor_b.clamped(),
            trials: u64::from(request.trials),
            seed: request.seed.unwrap_or_else(rand::random),
            match_length: request.match_length.unwrap_or(config.defaults.match_length),
        })
    }
}

/// Raw output of one batch, one record per run index.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub seed: u64,
    pub results: Vec<MatchResult>,
    pub elapsed: Duration,
}

// ============================================================================
// Runner
// ============================================================================

pub struct SimulationRunner<M: RatingModel = FootballRating> {
    model: M,
    generator: EventGenerator,
    rules: CardRules,
    config: RunnerConfig,
    pool: ThreadPool,
}

impl SimulationRunner<FootballRating> {
    pub fn new(config: &EngineConfig) -> Result<Self> {
        Self::with_model(config, FootballRating::new(config.rating.clone()))
    }
}

impl<M: RatingModel> SimulationRunner<M> {
    pub fn with_model(config: &EngineConfig, model: M) -> Result<Self> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(config.runner.workers)
            .thread_name(|i| format!("match-worker-{i}"))
            .build()
            .map_err(|e| EngineError::Configuration(format!("worker pool: {e}")))?;
        Ok(Self {
            model,
            generator: EventGenerator::new(config.rating.dismissal_share),
            rules: config.rating.cards.clone(),
            config: config.runner.clone(),
            pool,
        })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Run every trial of `plan`; `results[i]` always belongs to run index `i`.
    pub fn run(&self, plan: &BatchPlan, token: &CancellationToken) -> BatchOutcome {
        let started = Instant::now();
        let detail = self.config.batch_timeline;
        let mut results = Vec::with_capacity(plan.trials as usize);

        self.pool.install(|| {
            (0..plan.trials as usize)
                .into_par_iter()
                .map(|run_index| self.run_trial(plan, run_index as u64, detail, token))
                .collect_into_vec(&mut results);
        });

        BatchOutcome { seed: plan.seed, results, elapsed: started.elapsed() }
    }

    /// One trial on the calling thread, full timeline kept.
    pub fn run_single(
        &self,
        plan: &BatchPlan,
        run_index: u64,
        token: &CancellationToken,
    ) -> MatchResult {
        self.run_trial(plan, run_index, TimelineDetail::Full, token)
    }

    /// Panics inside a trial are contained and reported as that trial's failure.
    fn run_trial(
        &self,
        plan: &BatchPlan,
        run_index: u64,
        detail: TimelineDetail,
        token: &CancellationToken,
    ) -> MatchResult {
        let played = panic::catch_unwind(AssertUnwindSafe(|| {
            self.play(plan, run_index, detail, token)
        }));
        match played {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                tracing::debug!(run_index, %message, "trial panicked");
                MatchStateMachine::new(plan.match_length, self.rules.clone()).finish(
                    run_index,
                    plan.seed,
                    TerminalReason::Failed { failure: TrialFailure::Panicked(message) },
                )
            }
        }
    }

    fn play(
        &self,
        plan: &BatchPlan,
        run_index: u64,
        detail: TimelineDetail,
        token: &CancellationToken,
    ) -> MatchResult {
        let mut stream = RandomStream::derive(plan.seed, run_index);
        let mut machine =
            MatchStateMachine::new(plan.match_length, self.rules.clone()).with_timeline(detail);
        let finish = |machine: MatchStateMachine, reason| machine.finish(run_index, plan.seed, reason);

        loop {
            if token.is_cancelled() {
                return finish(machine, TerminalReason::Cancelled);
            }

            let tick = machine.next_tick();
            let probabilities = self.model.event_probabilities(
                &plan.competitor_a,
                &plan.competitor_b,
                tick,
                machine.state(),
            );
            let draw = match self.generator.next_event(&probabilities, &mut stream, tick) {
                Ok(draw) => draw,
                Err(failure) => {
                    tracing::debug!(run_index, %failure, "trial failed");
                    return finish(machine, TerminalReason::Failed { failure });
                }
            };
            if draw.renormalized {
                machine.note_renormalized();
            }

            match machine.apply(TimedEvent::new(tick, draw.event)) {
                Ok(Phase::Terminal) => return finish(machine, TerminalReason::Completed),
                Ok(Phase::InProgress) => {}
                Err(failure) => {
                    tracing::debug!(run_index, %failure, "trial failed");
                    return finish(machine, TerminalReason::Failed { failure });
                }
            }
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
