//! Per-trial output of the simulation engine.
//!
//! A [`MatchResult`] is the snapshot taken when a trial reaches its terminal
//! state. Failed and cancelled trials still produce one, so a batch always
//! yields exactly one record per run index.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::competitor::Side;
use super::event::TimedEvent;
use crate::error::TrialFailure;

/// Why a trial stopped. Exactly one per result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum TerminalReason {
    /// Clock reached the configured match length
    Completed,
    /// Cancellation was observed at a tick boundary
    Cancelled,
    /// Fatal invariant violation; the trial was aborted
    Failed { failure: TrialFailure },
}

/// Outcome class used for aggregate reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeClass {
    AWin,
    Draw,
    BWin,
}

impl OutcomeClass {
    pub fn from_score(score_a: u16, score_b: u16) -> Self {
        match score_a.cmp(&score_b) {
            std::cmp::Ordering::Greater => OutcomeClass::AWin,
            std::cmp::Ordering::Equal => OutcomeClass::Draw,
            std::cmp::Ordering::Less => OutcomeClass::BWin,
        }
    }
}

/// Cards shown to one side during a trial.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CardTally {
    pub cautions: u16,
    pub dismissals: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchResult {
    pub run_index: u64,
    /// Request seed the trial's stream was derived from
    pub seed: u64,
    pub score_a: u16,
    pub score_b: u16,
    pub match_length: u32,
    pub ticks_played: u32,
    pub timeline: Vec<TimedEvent>,
    pub terminal_reason: TerminalReason,
    pub cards_a: CardTally,
    pub cards_b: CardTally,
    /// Ticks whose probabilities summed above 1 and were renormalized
    pub renormalized_ticks: u32,
}

impl MatchResult {
    pub fn score(&self, side: Side) -> u16 {
        match side {
            Side::A => self.score_a,
            Side::B => self.score_b,
        }
    }

    pub fn cards(&self, side: Side) -> CardTally {
        match side {
            Side::A => self.cards_a,
            Side::B => self.cards_b,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.terminal_reason, TerminalReason::Completed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.terminal_reason, TerminalReason::Failed { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.terminal_reason, TerminalReason::Cancelled)
    }

    /// Outcome class, only for trials that ran to completion.
    pub fn outcome(&self) -> Option<OutcomeClass> {
        self.is_completed().then(|| OutcomeClass::from_score(self.score_a, self.score_b))
    }

    /// Score margin from side A's point of view.
    pub fn margin(&self) -> i32 {
        i32::from(self.score_a) - i32::from(self.score_b)
    }

    /// SHA-256 hex digest of the canonical JSON encoding.
    ///
    /// Stable for a given seed, request and engine version; callers keep it as
    /// a golden value for regression checks.
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let digest = Sha256::digest(&bytes);
        let mut out = String::with_capacity(digest.len() * 2);
        for b in digest {
            out.push_str(&format!("{:02x}", b));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::event::MatchEvent;

    fn sample(reason: TerminalReason) -> MatchResult {
        MatchResult {
            run_index: 0,
            seed: 42,
            score_a: 2,
            score_b: 1,
            match_length: 90,
            ticks_played: 90,
            timeline: vec![
                TimedEvent::new(12, MatchEvent::Goal { side: Side::A }),
                TimedEvent::new(40, MatchEvent::Goal { side: Side::B }),
                TimedEvent::new(77, MatchEvent::Goal { side: Side::A }),
            ],
            terminal_reason: reason,
            cards_a: CardTally::default(),
            cards_b: CardTally { cautions: 1, dismissals: 0 },
            renormalized_ticks: 0,
        }
    }

    #[test]
    fn test_outcome_only_for_completed() {
        assert_eq!(sample(TerminalReason::Completed).outcome(), Some(OutcomeClass::AWin));
        assert_eq!(sample(TerminalReason::Cancelled).outcome(), None);
        let failed = sample(TerminalReason::Failed {
            failure: TrialFailure::ScoreOverflow { tick: 3 },
        });
        assert_eq!(failed.outcome(), None);
        assert!(failed.is_failed());
    }

    #[test]
    fn test_outcome_class_from_score() {
        assert_eq!(OutcomeClass::from_score(0, 0), OutcomeClass::Draw);
        assert_eq!(OutcomeClass::from_score(1, 3), OutcomeClass::BWin);
        assert_eq!(OutcomeClass::from_score(4, 3), OutcomeClass::AWin);
    }

    #[test]
    fn test_margin_and_accessors() {
        let result = sample(TerminalReason::Completed);
        assert_eq!(result.margin(), 1);
        assert_eq!(result.score(Side::B), 1);
        assert_eq!(result.cards(Side::B).cautions, 1);
    }

    #[test]
    fn test_digest_stable_and_sensitive() {
        let a = sample(TerminalReason::Completed);
        let mut b = a.clone();
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 64);

        b.score_b = 2;
        assert_ne!(a.digest(), b.digest());
    }

    #[test]
    fn test_terminal_reason_round_trip() {
        let result = sample(TerminalReason::Failed {
            failure: TrialFailure::EventAfterTerminal { tick: 91 },
        });
        let json = serde_json::to_string(&result).unwrap();
        let back: MatchResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
