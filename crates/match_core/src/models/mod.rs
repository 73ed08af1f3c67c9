//! Request and response shapes exchanged with the engine's callers.

mod competitor;
mod distribution;
mod event;
mod request;
mod result;

pub use competitor::{Competitor, Side, MAX_FORM, MAX_STRENGTH, MIN_FORM, MIN_STRENGTH};
pub use distribution::{
    MatchDistribution, OutcomeEstimate, OutcomeProbabilities, ScoreBucket, SummaryStats,
};
pub use event::{CardSeverity, MatchEvent, TimedEvent};
pub use request::MatchRequest;
pub use result::{CardTally, MatchResult, OutcomeClass, TerminalReason};
