//! Rating model and card-rule tunables

use serde::{Deserialize, Serialize};

/// Per-tick event rates for the default discipline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    /// Goal probability per tick for two average sides (default: 0.015)
    pub base_goal_rate: f64,
    /// Card probability per tick per side (default: 0.02)
    pub base_card_rate: f64,
    /// Exponent on the offense/defense ratio (default: 1.0)
    pub strength_sensitivity: f64,
    /// Exponent on opponent pressure for card rates (default: 0.5)
    pub card_pressure: f64,
    /// Extra goal rate reached at the final tick, linear ramp (default: 0.2)
    pub late_goal_boost: f64,
    /// Multiplier bonus on side A's offense, e.g. home advantage (default: 0.0)
    pub advantage_a: f64,
    /// Cap applied to each individual event probability (default: 0.25)
    pub max_event_probability: f64,
    /// Share of cards drawn as dismissals (default: 0.06)
    pub dismissal_share: f64,
    pub cards: CardRules,
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            base_goal_rate: 0.015,
            base_card_rate: 0.02,
            strength_sensitivity: 1.0,
            card_pressure: 0.5,
            late_goal_boost: 0.2,
            advantage_a: 0.0,
            max_event_probability: 0.25,
            dismissal_share: 0.06,
            cards: CardRules::default(),
        }
    }
}

/// Penalties a card applies to the carded side's effective strength
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CardRules {
    /// Strength penalty while a caution is active (default: 0.05)
    pub caution_penalty: f64,
    /// Ticks a caution stays active (default: 10)
    pub caution_duration: u32,
    /// Strength penalty from a dismissal, held to the end (default: 0.15)
    pub dismissal_penalty: f64,
    /// Cap on the summed penalty of one side (default: 0.6)
    pub max_penalty: f64,
}

impl Default for CardRules {
    fn default() -> Self {
        Self {
            caution_penalty: 0.05,
            caution_duration: 10,
            dismissal_penalty: 0.15,
            max_penalty: 0.6,
        }
    }
}

impl RatingConfig {
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let unit = |name: &str, v: f64, problems: &mut Vec<String>| {
            if !(0.0..=1.0).contains(&v) {
                problems.push(format!("rating.{name} must be within [0, 1], got {v}"));
            }
        };
        unit("base_goal_rate", self.base_goal_rate, &mut problems);
        unit("base_card_rate", self.base_card_rate, &mut problems);
        unit("dismissal_share", self.dismissal_share, &mut problems);
        unit("cards.caution_penalty", self.cards.caution_penalty, &mut problems);
        unit("cards.dismissal_penalty", self.cards.dismissal_penalty, &mut problems);
        unit("cards.max_penalty", self.cards.max_penalty, &mut problems);
        if !(self.max_event_probability > 0.0 && self.max_event_probability <= 1.0) {
            problems.push(format!(
                "rating.max_event_probability must be within (0, 1], got {}",
                self.max_event_probability
            ));
        }
        for (name, v) in [
            ("strength_sensitivity", self.strength_sensitivity),
            ("card_pressure", self.card_pressure),
            ("late_goal_boost", self.late_goal_boost),
            ("advantage_a", self.advantage_a),
        ] {
            if !v.is_finite() || v < 0.0 {
                problems.push(format!("rating.{name} must be finite and >= 0, got {v}"));
            }
        }
        problems
    }
}
