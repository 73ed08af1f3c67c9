//! Side-swap symmetry check
//!
//! Runs a batch and its mirror (competitors exchanged) under the same seed.
//! In an unbiased engine a competitor's win probability does not depend on
//! which side it is listed on, so `base.a_win` should track `mirror.b_win`.
//! Differences beyond the tolerance are reported as violations.

use serde::{Deserialize, Serialize};

use crate::engine::{MatchEngine, RatingModel};
use crate::error::Result;
use crate::models::{MatchDistribution, MatchRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationType {
    /// A competitor's win probability moves when it changes side
    SideBias,
    /// Draw probability moves when sides are exchanged
    DrawShift,
    /// Identical competitors do not split wins evenly
    SideAdvantage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryViolation {
    pub violation_type: ViolationType,
    pub description: String,
    /// Excess of the delta over the tolerance, relative to it, capped at 1.0
    pub severity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SymmetryReport {
    pub seed: u64,
    pub tolerance: f64,
    pub base: MatchDistribution,
    pub mirrored: MatchDistribution,
    /// `base.a_win - mirrored.b_win`
    pub win_delta: f64,
    pub draw_delta: f64,
    pub violations: Vec<SymmetryViolation>,
    pub is_symmetric: bool,
}

#[derive(Debug, Clone)]
pub struct SymmetryCheck {
    seed: u64,
    tolerance: f64,
}

impl SymmetryCheck {
    pub fn new(seed: u64) -> Self {
        Self { seed, tolerance: 0.02 }
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance.clamp(0.0, 1.0);
        self
    }

    pub fn run<M: RatingModel>(
        &self,
        engine: &MatchEngine<M>,
        request: &MatchRequest,
    ) -> Result<SymmetryReport> {
        let request = request.clone().with_seed(self.seed);
        let base = engine.simulate_batch(&request)?;
        let mirrored = engine.simulate_batch(&request.mirrored())?;

        let win_delta = base.outcomes.a_win.probability - mirrored.outcomes.b_win.probability;
        let draw_delta = base.outcomes.draw.probability - mirrored.outcomes.draw.probability;
        let (a, b) = (request.competitor_a.clamped(), request.competitor_b.clamped());
        let identical = a.offense == b.offense && a.defense == b.defense && a.form == b.form;

        let mut violations = Vec::new();
        if win_delta.abs() > self.tolerance {
            violations.push(self.violation(
                ViolationType::SideBias,
                win_delta,
                format!(
                    "'{}' wins {:.4} as side A but {:.4} as side B",
                    request.competitor_a.id,
                    base.outcomes.a_win.probability,
                    mirrored.outcomes.b_win.probability
                ),
            ));
        }
        if draw_delta.abs() > self.tolerance {
            violations.push(self.violation(
                ViolationType::DrawShift,
                draw_delta,
                format!(
                    "draw probability {:.4} becomes {:.4} after swapping sides",
                    base.outcomes.draw.probability, mirrored.outcomes.draw.probability
                ),
            ));
        }
        if identical {
            let split = base.outcomes.a_win.probability - base.outcomes.b_win.probability;
            if split.abs() > self.tolerance {
                violations.push(self.violation(
                    ViolationType::SideAdvantage,
                    split,
                    format!(
                        "identical competitors: A wins {:.4}, B wins {:.4}",
                        base.outcomes.a_win.probability, base.outcomes.b_win.probability
                    ),
                ));
            }
        }

        for v in &violations {
            tracing::warn!(kind = ?v.violation_type, severity = v.severity, "{}", v.description);
        }

        Ok(SymmetryReport {
            seed: self.seed,
            tolerance: self.tolerance,
            base,
            mirrored,
            win_delta,
            draw_delta,
            is_symmetric: violations.is_empty(),
            violations,
        })
    }

    fn violation(
        &self,
        violation_type: ViolationType,
        delta: f64,
        description: String,
    ) -> SymmetryViolation {
        let severity = if self.tolerance > 0.0 {
            (delta.abs() / self.tolerance - 1.0).clamp(0.0, 1.0)
        } else {
            1.0
        };
        SymmetryViolation { violation_type, description, severity }
    }
}
