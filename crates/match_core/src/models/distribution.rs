use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Count and probability for one outcome class, with a 95% Wilson interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeEstimate {
    pub count: u64,
    pub probability: f64,
    pub lower: f64,
    pub upper: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutcomeProbabilities {
    pub a_win: OutcomeEstimate,
    pub draw: OutcomeEstimate,
    pub b_win: OutcomeEstimate,
}

impl OutcomeProbabilities {
    pub fn total(&self) -> f64 {
        self.a_win.probability + self.draw.probability + self.b_win.probability
    }
}

/// One histogram bucket keyed by the exact final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreBucket {
    pub score_a: u16,
    pub score_b: u16,
    pub count: u64,
    pub frequency: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SummaryStats {
    pub mean: f64,
    /// Sample variance (n - 1 denominator); zero below two samples
    pub variance: f64,
    pub std_dev: f64,
}

/// Aggregate over one batch of trials.
///
/// Only completed trials feed the probabilities, histogram and summaries.
/// Failed and cancelled trials appear as counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MatchDistribution {
    pub seed: u64,
    pub requested_trials: u64,
    pub completed_trials: u64,
    pub failed_trials: u64,
    pub cancelled_trials: u64,
    /// Set when the batch was cancelled before every trial completed
    pub partial: bool,
    /// Set when no trial completed; probabilities are all zero
    pub insufficient_data: bool,
    pub outcomes: OutcomeProbabilities,
    /// Sorted by (score_a, score_b)
    pub score_histogram: Vec<ScoreBucket>,
    pub most_likely_score: Option<ScoreBucket>,
    pub margin: SummaryStats,
    pub goals_a: SummaryStats,
    pub goals_b: SummaryStats,
    pub total_goals: SummaryStats,
    /// Ticks renormalized by the event generator across the batch
    pub data_quality_warnings: u64,
}

impl MatchDistribution {
    pub fn bucket(&self, score_a: u16, score_b: u16) -> Option<&ScoreBucket> {
        self.score_histogram
            .binary_search_by(|b| (b.score_a, b.score_b).cmp(&(score_a, score_b)))
            .ok()
            .map(|idx| &self.score_histogram[idx])
    }

    /// Failed share among trials that actually ran (cancelled ones excluded).
    pub fn failure_rate(&self) -> f64 {
        let ran = self.completed_trials + self.failed_trials;
        if ran == 0 {
            0.0
        } else {
            self.failed_trials as f64 / ran as f64
        }
    }
}
