//! Rating model: competitor attributes to per-tick event probabilities
//!
//! The discipline is pluggable through [`RatingModel`]. [`FootballRating`] is
//! the default, a rate model where goal chances scale with the attacker's
//! effective offense over the defender's effective defense.

use serde::{Deserialize, Serialize};

use super::state_machine::MatchState;
use crate::config::RatingConfig;
use crate::models::{Competitor, Side};

/// Probabilities of the mutually exclusive per-tick events.
///
/// The remainder `1 - sum` is the probability of `NoEvent`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct EventProbabilities {
    pub goal_a: f64,
    pub goal_b: f64,
    pub card_a: f64,
    pub card_b: f64,
}

impl EventProbabilities {
    pub fn sum(&self) -> f64 {
        self.goal_a + self.goal_b + self.card_a + self.card_b
    }

    pub fn no_event(&self) -> f64 {
        (1.0 - self.sum()).max(0.0)
    }

    /// Values in the fixed partition order: goal A, goal B, card A, card B.
    pub fn as_array(&self) -> [f64; 4] {
        [self.goal_a, self.goal_b, self.card_a, self.card_b]
    }
}

/// Maps two competitors and the current match state to event probabilities.
///
/// Implementations must be pure: equal inputs give bit-equal outputs, which
/// deterministic replay depends on. Out-of-range attributes are clamped, never
/// rejected.
pub trait RatingModel: Send + Sync {
    fn event_probabilities(
        &self,
        a: &Competitor,
        b: &Competitor,
        tick: u32,
        state: &MatchState,
    ) -> EventProbabilities;

    fn name(&self) -> &'static str {
        "custom"
    }
}

/// Default football-like discipline.
#[derive(Debug, Clone, Default)]
pub struct FootballRating {
    config: RatingConfig,
}

impl FootballRating {
    pub fn new(config: RatingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RatingConfig {
        &self.config
    }

    /// Offense and defense after form, advantage and card penalties.
    fn effective(&self, competitor: &Competitor, side: Side, state: &MatchState) -> (f64, f64) {
        let c = competitor.clamped();
        let fitness = c.form * (1.0 - state.penalty(side));
        let advantage = match side {
            Side::A => 1.0 + self.config.advantage_a,
            Side::B => 1.0,
        };
        (c.offense * fitness * advantage, c.defense * fitness)
    }

    fn cap(&self, p: f64) -> f64 {
        p.clamp(0.0, self.config.max_event_probability)
    }
}

impl RatingModel for FootballRating {
    fn event_probabilities(
        &self,
        a: &Competitor,
        b: &Competitor,
        tick: u32,
        state: &MatchState,
    ) -> EventProbabilities {
        let cfg = &self.config;
        let effective = [self.effective(a, Side::A, state), self.effective(b, Side::B, state)];

        let progress = f64::from(tick.min(state.match_length())) / f64::from(state.match_length());
        let tempo = 1.0 + cfg.late_goal_boost * progress;

        let goal = |side: Side| {
            let (off, _) = effective[side.index()];
            let (_, def) = effective[side.opponent().index()];
            self.cap(cfg.base_goal_rate * tempo * (off / def).powf(cfg.strength_sensitivity))
        };
        // A side under pressure concedes more fouls.
        let card = |side: Side| {
            let (own_off, _) = effective[side.index()];
            let (opp_off, _) = effective[side.opponent().index()];
            self.cap(cfg.base_card_rate * (opp_off / own_off).powf(cfg.card_pressure))
        };

        EventProbabilities {
            goal_a: goal(Side::A),
            goal_b: goal(Side::B),
            card_a: card(Side::A),
            card_b: card(Side::B),
        }
    }

    fn name(&self) -> &'static str {
        "football"
    }
}
