//! Batch runner settings

use serde::{Deserialize, Serialize};

/// How much of a trial's timeline is retained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimelineDetail {
    /// Every tick, `NoEvent` included
    Full,
    /// Goals and cards only; quiet ticks are implied by the tick stamps
    Significant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Worker threads; 0 sizes the pool to available compute (default: 0)
    pub workers: usize,
    /// Failed share of run trials above which the batch is a systemic failure (default: 0.05)
    pub failure_threshold: f64,
    /// Timeline retention for batch trials (default: significant)
    pub batch_timeline: TimelineDetail,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            workers: 0,
            failure_threshold: 0.05,
            batch_timeline: TimelineDetail::Significant,
        }
    }
}

impl RunnerConfig {
    pub(crate) fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if !(0.0..=1.0).contains(&self.failure_threshold) {
            problems.push(format!(
                "runner.failure_threshold must be within [0, 1], got {}",
                self.failure_threshold
            ));
        }
        problems
    }
}
