use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::competitor::Side;

/// Disciplinary weight of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CardSeverity {
    /// Timed penalty, cleared at its expiry tick
    Caution,
    /// Penalty that lasts until the end of the match
    Dismissal,
}

/// The closed set of things that can happen in one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEvent {
    Goal { side: Side },
    Card { side: Side, severity: CardSeverity },
    NoEvent,
}

impl MatchEvent {
    pub fn is_significant(&self) -> bool {
        !matches!(self, MatchEvent::NoEvent)
    }

    pub fn is_goal(&self) -> bool {
        matches!(self, MatchEvent::Goal { .. })
    }
}

/// A [`MatchEvent`] stamped with the tick it was applied at (1-based).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TimedEvent {
    pub tick: u32,
    #[serde(flatten)]
    pub event: MatchEvent,
}

impl TimedEvent {
    pub fn new(tick: u32, event: MatchEvent) -> Self {
        Self { tick, event }
    }
}
