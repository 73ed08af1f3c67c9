//! Reduce a batch of trial results into a [`MatchDistribution`]
//!
//! Moments are accumulated with Welford's update and partial accumulators are
//! merged with Chan's parallel formula, which keeps rounding error bounded at
//! 10^5 to 10^6 trials. Batches are cut into fixed-size chunks that are
//! reduced in parallel and merged in index order, so the floating-point result
//! does not depend on scheduling.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::models::{
    MatchDistribution, MatchResult, OutcomeClass, OutcomeEstimate, OutcomeProbabilities,
    ScoreBucket, SummaryStats,
};

/// Chunk length for parallel reduction; fixed so merge order is reproducible.
const CHUNK: usize = 4096;

/// z-score of a two-sided 95% interval.
const Z_95: f64 = 1.959_963_984_540_054;

/// Running mean and sum of squared deviations.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    n: u64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    pub fn push(&mut self, x: f64) {
        self.n += 1;
        let delta = x - self.mean;
        self.mean += delta / self.n as f64;
        self.m2 += delta * (x - self.mean);
    }

    pub fn merge(&mut self, other: &RunningStats) {
        if other.n == 0 {
            return;
        }
        if self.n == 0 {
            *self = *other;
            return;
        }
        let n = self.n + other.n;
        let delta = other.mean - self.mean;
        let (na, nb, nf) = (self.n as f64, other.n as f64, n as f64);
        self.mean += delta * nb / nf;
        self.m2 += other.m2 + delta * delta * na * nb / nf;
        self.n = n;
    }

    pub fn summary(&self) -> SummaryStats {
        if self.n == 0 {
            return SummaryStats::default();
        }
        let variance = if self.n > 1 { self.m2 / (self.n - 1) as f64 } else { 0.0 };
        SummaryStats { mean: self.mean, variance, std_dev: variance.sqrt() }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResultAggregator {
    a_wins: u64,
    draws: u64,
    b_wins: u64,
    failed: u64,
    cancelled: u64,
    histogram: BTreeMap<(u16, u16), u64>,
    margin: RunningStats,
    goals_a: RunningStats,
    goals_b: RunningStats,
    total_goals: RunningStats,
    renormalized: u64,
}

impl ResultAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Aggregate a whole batch. `results[i]` must be run index `i`.
    pub fn aggregate(results: &[MatchResult]) -> MatchDistribution {
        let seed = results.first().map(|r| r.seed).unwrap_or_default();
        Self::reduce(results).finish(results.len() as u64, seed)
    }

    /// Chunked parallel reduction, merged in chunk order.
    pub fn reduce(results: &[MatchResult]) -> Self {
        let partials: Vec<ResultAggregator> = results
            .par_chunks(CHUNK)
            .map(|chunk| {
                let mut agg = ResultAggregator::new();
                chunk.iter().for_each(|r| agg.push(r));
                agg
            })
            .collect();

        partials.into_iter().fold(ResultAggregator::new(), |mut acc, part| {
            acc.merge(&part);
            acc
        })
    }

    pub fn push(&mut self, result: &MatchResult) {
        self.renormalized += u64::from(result.renormalized_ticks);
        let Some(outcome) = result.outcome() else {
            if result.is_failed() {
                self.failed += 1;
            } else {
                self.cancelled += 1;
            }
            return;
        };

        match outcome {
            OutcomeClass::AWin => self.a_wins += 1,
            OutcomeClass::Draw => self.draws += 1,
            OutcomeClass::BWin => self.b_wins += 1,
        }
        *self.histogram.entry((result.score_a, result.score_b)).or_insert(0) += 1;
        self.margin.push(f64::from(result.margin()));
        self.goals_a.push(f64::from(result.score_a));
        self.goals_b.push(f64::from(result.score_b));
        self.total_goals.push(f64::from(result.score_a) + f64::from(result.score_b));
    }

    pub fn merge(&mut self, other: &ResultAggregator) {
        self.a_wins += other.a_wins;
        self.draws += other.draws;
        self.b_wins += other.b_wins;
        self.failed += other.failed;
        self.cancelled += other.cancelled;
        self.renormalized += other.renormalized;
        for (score, count) in &other.histogram {
            *self.histogram.entry(*score).or_insert(0) += count;
        }
        self.margin.merge(&other.margin);
        self.goals_a.merge(&other.goals_a);
        self.goals_b.merge(&other.goals_b);
        self.total_goals.merge(&other.total_goals);
    }

    pub fn completed(&self) -> u64 {
        self.a_wins + self.draws + self.b_wins
    }

    pub fn finish(self, requested_trials: u64, seed: u64) -> MatchDistribution {
        let completed = self.completed();
        let n = completed as f64;

        let score_histogram: Vec<ScoreBucket> = self
            .histogram
            .iter()
            .map(|(&(score_a, score_b), &count)| ScoreBucket {
                score_a,
                score_b,
                count,
                frequency: if completed == 0 { 0.0 } else { count as f64 / n },
            })
            .collect();
        // Ties resolve to the lowest score in histogram order.
        let most_likely_score = score_histogram
            .iter()
            .copied()
            .reduce(|best, b| if b.count > best.count { b } else { best });

        MatchDistribution {
            seed,
            requested_trials,
            completed_trials: completed,
            failed_trials: self.failed,
            cancelled_trials: self.cancelled,
            partial: self.cancelled > 0,
            insufficient_data: completed == 0,
            outcomes: OutcomeProbabilities {
                a_win: estimate(self.a_wins, completed),
                draw: estimate(self.draws, completed),
                b_win: estimate(self.b_wins, completed),
            },
            score_histogram,
            most_likely_score,
            margin: self.margin.summary(),
            goals_a: self.goals_a.summary(),
            goals_b: self.goals_b.summary(),
            total_goals: self.total_goals.summary(),
            data_quality_warnings: self.renormalized,
        }
    }
}

/// Point estimate with a Wilson score interval.
///
/// `lower` is exactly 0 when `count == 0` and `upper` exactly 1 when
/// `count == total`.
fn estimate(count: u64, total: u64) -> OutcomeEstimate {
    if total == 0 {
        return OutcomeEstimate::default();
    }
    let n = total as f64;
    let p = count as f64 / n;
    let z2 = Z_95 * Z_95;
    let denom = 1.0 + z2 / n;
    let center = (p + z2 / (2.0 * n)) / denom;
    let half = Z_95 * (p * (1.0 - p) / n + z2 / (4.0 * n * n)).sqrt() / denom;
    OutcomeEstimate {
        count,
        probability: p,
        lower: if count == 0 { 0.0 } else { (center - half).max(0.0) },
        upper: if count == total { 1.0 } else { (center + half).min(1.0) },
    }
}
