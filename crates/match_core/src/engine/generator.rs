//! Event generator: one categorical draw per tick
//!
//! `[0, 1)` is cut into contiguous intervals in a fixed order:
//!
//! ```text
//! | goal A | goal B | card A (caution | dismissal) | card B (caution | dismissal) | no event |
//! ```
//!
//! A single `next_uniform()` picks the interval, so the same draw always maps
//! to the same event. The card intervals are split by the dismissal share
//! without a second draw.

use super::random::RandomStream;
use super::rating::EventProbabilities;
use crate::error::TrialFailure;
use crate::models::{CardSeverity, MatchEvent, Side};

/// Sums above `1 + SUM_TOLERANCE` are renormalized and flagged.
const SUM_TOLERANCE: f64 = 1e-12;

/// Event chosen for a tick plus whether its probabilities had to be rescaled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Draw {
    pub event: MatchEvent,
    pub renormalized: bool,
}

#[derive(Debug, Clone)]
pub struct EventGenerator {
    dismissal_share: f64,
}

impl EventGenerator {
    pub fn new(dismissal_share: f64) -> Self {
        Self { dismissal_share: dismissal_share.clamp(0.0, 1.0) }
    }

    /// Draw the event for `tick`.
    ///
    /// Negative or non-finite probabilities break the rating-model contract
    /// and fail the trial. A sum above one is recovered by renormalizing,
    /// which leaves no room for `NoEvent`.
    pub fn next_event(
        &self,
        probabilities: &EventProbabilities,
        stream: &mut RandomStream,
        tick: u32,
    ) -> Result<Draw, TrialFailure> {
        let (weights, renormalized) = normalize(probabilities, tick)?;
        let u = stream.next_uniform();
        Ok(Draw { event: self.pick(&weights, u), renormalized })
    }

    fn pick(&self, weights: &[f64; 4], u: f64) -> MatchEvent {
        let mut upper = 0.0;

        upper += weights[0];
        if u < upper {
            return MatchEvent::Goal { side: Side::A };
        }
        upper += weights[1];
        if u < upper {
            return MatchEvent::Goal { side: Side::B };
        }
        for (side, weight) in [(Side::A, weights[2]), (Side::B, weights[3])] {
            let start = upper;
            upper += weight;
            if u < upper {
                let caution_end = start + weight * (1.0 - self.dismissal_share);
                let severity = if u < caution_end {
                    CardSeverity::Caution
                } else {
                    CardSeverity::Dismissal
                };
                return MatchEvent::Card { side, severity };
            }
        }
        MatchEvent::NoEvent
    }
}

fn normalize(p: &EventProbabilities, tick: u32) -> Result<([f64; 4], bool), TrialFailure> {
    let weights = p.as_array();
    if let Some(bad) = weights.iter().find(|w| !w.is_finite() || **w < 0.0) {
        return Err(TrialFailure::InvalidProbabilities {
            tick,
            detail: format!("probability {bad} outside [0, 1]"),
        });
    }

    let sum: f64 = weights.iter().sum();
    if sum <= 1.0 + SUM_TOLERANCE {
        return Ok((weights, false));
    }
    Ok((weights.map(|w| w / sum), true))
}
