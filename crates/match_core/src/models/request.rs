use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::competitor::Competitor;
use crate::error::{EngineError, Result};

fn default_trials() -> u32 {
    1
}

/// Simulation request as built by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct MatchRequest {
    #[validate]
    pub competitor_a: Competitor,
    #[validate]
    pub competitor_b: Competitor,
    #[serde(default = "default_trials")]
    #[validate(range(min = 1, max = 10_000_000))]
    pub trials: u32,
    /// Fixed seed; when absent the engine picks one and reports it back.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Match length in ticks; falls back to the configured default.
    #[serde(default)]
    #[validate(range(min = 1, max = 100_000))]
    pub match_length: Option<u32>,
}

impl MatchRequest {
    /// Single seeded run.
    pub fn single(competitor_a: Competitor, competitor_b: Competitor, seed: u64) -> Self {
        Self { competitor_a, competitor_b, trials: 1, seed: Some(seed), match_length: None }
    }

    /// Batch of `trials` runs without a fixed seed.
    pub fn batch(competitor_a: Competitor, competitor_b: Competitor, trials: u32) -> Self {
        Self { competitor_a, competitor_b, trials, seed: None, match_length: None }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_match_length(mut self, ticks: u32) -> Self {
        self.match_length = Some(ticks);
        self
    }

    /// Same request with the two competitors exchanged.
    pub fn mirrored(&self) -> Self {
        Self {
            competitor_a: self.competitor_b.clone(),
            competitor_b: self.competitor_a.clone(),
            ..self.clone()
        }
    }

    /// Full pre-flight check: derive rules plus attribute domains after clamping.
    pub fn check(&self) -> Result<()> {
        self.validate()?;
        for competitor in [&self.competitor_a, &self.competitor_b] {
            if !competitor.clamped().is_finite() {
                return Err(EngineError::Configuration(format!(
                    "competitor '{}' has non-finite attributes",
                    competitor.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> (Competitor, Competitor) {
        (Competitor::new("home", 1.2, 1.0), Competitor::new("away", 1.0, 1.0))
    }

    #[test]
    fn test_single_request_is_valid() {
        let (a, b) = pair();
        let request = MatchRequest::single(a, b, 42);
        assert!(request.check().is_ok());
        assert_eq!(request.trials, 1);
        assert_eq!(request.seed, Some(42));
    }

    #[test]
    fn test_zero_trials_rejected() {
        let (a, b) = pair();
        let request = MatchRequest::batch(a, b, 0);
        assert!(matches!(request.check(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_zero_match_length_rejected() {
        let (a, b) = pair();
        let request = MatchRequest::single(a, b, 1).with_match_length(0);
        assert!(matches!(request.check(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_nested_competitor_validated() {
        let (_, b) = pair();
        let request = MatchRequest::single(Competitor::new("", 1.0, 1.0), b, 1);
        assert!(matches!(request.check(), Err(EngineError::Validation(_))));
    }

    #[test]
    fn test_non_finite_attribute_rejected() {
        let (a, _) = pair();
        let request = MatchRequest::single(a, Competitor::new("nan", f64::INFINITY, 1.0), 1);
        assert!(matches!(request.check(), Err(EngineError::Configuration(_))));
    }

    #[test]
    fn test_out_of_range_attributes_accepted() {
        let request = MatchRequest::single(
            Competitor::new("strong", 99.0, 99.0),
            Competitor::new("weak", -1.0, 0.0).with_form(0.0),
            7,
        );
        assert!(request.check().is_ok());
    }

    #[test]
    fn test_negative_trials_fail_to_parse() {
        let json = r#"{
            "competitor_a": {"id": "a", "offense": 1.0, "defense": 1.0},
            "competitor_b": {"id": "b", "offense": 1.0, "defense": 1.0},
            "trials": -5
        }"#;
        assert!(serde_json::from_str::<MatchRequest>(json).is_err());
    }

    #[test]
    fn test_mirrored_swaps_competitors() {
        let (a, b) = pair();
        let request = MatchRequest::batch(a.clone(), b.clone(), 10).with_seed(3);
        let mirrored = request.mirrored();
        assert_eq!(mirrored.competitor_a, b);
        assert_eq!(mirrored.competitor_b, a);
        assert_eq!(mirrored.seed, Some(3));
        assert_eq!(mirrored.trials, 10);
    }
}
