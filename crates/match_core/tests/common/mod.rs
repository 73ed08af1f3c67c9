#![allow(dead_code)]

use std::sync::atomic::{AtomicU64, Ordering};

use match_core::engine::{EventProbabilities, MatchState};
use match_core::{
    CancellationToken, Competitor, EngineConfig, FootballRating, MatchEngine, MatchRequest,
    RatingModel, Side,
};

pub fn scenario_request(seed: u64) -> MatchRequest {
    MatchRequest::single(Competitor::new("a", 1.2, 1.0), Competitor::new("b", 1.0, 1.0), seed)
        .with_match_length(90)
}

pub fn batch_request(trials: u32, seed: u64) -> MatchRequest {
    MatchRequest::batch(Competitor::new("a", 1.2, 1.0), Competitor::new("b", 1.0, 1.0), trials)
        .with_seed(seed)
}

pub fn engine(config: EngineConfig) -> MatchEngine {
    MatchEngine::new(config).unwrap()
}

/// Default model that trips a token after a fixed number of evaluations.
pub struct CancelAfter {
    inner: FootballRating,
    remaining: AtomicU64,
    token: CancellationToken,
}

impl CancelAfter {
    pub fn new(calls: u64, token: CancellationToken) -> Self {
        Self { inner: FootballRating::default(), remaining: AtomicU64::new(calls), token }
    }
}

impl RatingModel for CancelAfter {
    fn event_probabilities(
        &self,
        a: &Competitor,
        b: &Competitor,
        tick: u32,
        state: &MatchState,
    ) -> EventProbabilities {
        if self.remaining.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.token.cancel();
        }
        self.inner.event_probabilities(a, b, tick, state)
    }
}

/// Breaks the probability contract on every tick.
pub struct AlwaysNan;

impl RatingModel for AlwaysNan {
    fn event_probabilities(
        &self,
        _a: &Competitor,
        _b: &Competitor,
        _tick: u32,
        _state: &MatchState,
    ) -> EventProbabilities {
        EventProbabilities { goal_a: f64::NAN, ..Default::default() }
    }
}

/// Fails only trials where side B scores first.
pub struct FailsWhenBLeads;

impl RatingModel for FailsWhenBLeads {
    fn event_probabilities(
        &self,
        _a: &Competitor,
        _b: &Competitor,
        _tick: u32,
        state: &MatchState,
    ) -> EventProbabilities {
        let goal_a = if state.score(Side::B) > state.score(Side::A) { -1.0 } else { 0.02 };
        EventProbabilities { goal_a, goal_b: 0.02, card_a: 0.0, card_b: 0.0 }
    }
}
