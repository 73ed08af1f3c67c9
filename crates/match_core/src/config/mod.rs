//! # Engine Configuration
//!
//! All tuning constants for the rating model, the card rules and the batch
//! runner live here, with presets for common scoring environments.
//!
//! ```rust
//! use match_core::config::EngineConfig;
//!
//! let config = EngineConfig::default();
//! let open = EngineConfig::high_scoring();
//! assert!(open.rating.base_goal_rate > config.rating.base_goal_rate);
//! ```

mod env;
mod rating_config;
mod runner_config;

pub use env::{CONFIG_PATH_ENV, WORKERS_ENV};
pub use rating_config::{CardRules, RatingConfig};
pub use runner_config::{RunnerConfig, TimelineDetail};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{EngineError, Result};

/// Request defaults applied when the caller leaves a field unset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Match length in ticks (default: 90)
    pub match_length: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self { match_length: 90 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct EngineConfig {
    pub rating: RatingConfig,
    pub runner: RunnerConfig,
    pub defaults: DefaultsConfig,
}

impl EngineConfig {
    /// Football-like scoring (default)
    pub fn realistic() -> Self {
        Self::default()
    }

    /// More goals, steeper late-match push
    pub fn high_scoring() -> Self {
        let mut cfg = Self::default();
        cfg.rating.base_goal_rate = 0.03;
        cfg.rating.late_goal_boost = 0.3;
        cfg.rating.base_card_rate = 0.015;
        cfg
    }

    /// Tight, low-scoring contests with more cards
    pub fn defensive() -> Self {
        let mut cfg = Self::default();
        cfg.rating.base_goal_rate = 0.009;
        cfg.rating.base_card_rate = 0.028;
        cfg.rating.strength_sensitivity = 0.8;
        cfg
    }

    /// Small fixed pool, failures never escalate
    pub fn testing() -> Self {
        let mut cfg = Self::default();
        cfg.runner.workers = 2;
        cfg.runner.failure_threshold = 1.0;
        cfg
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let config: EngineConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check tunables for consistency; all problems are reported at once.
    pub fn validate(&self) -> Result<()> {
        let mut problems = self.rating.problems();
        problems.extend(self.runner.problems());
        if self.defaults.match_length == 0 {
            problems.push("defaults.match_length must be > 0".to_string());
        }
        if problems.is_empty() {
            Ok(())
        } else {
            Err(EngineError::Configuration(problems.join("; ")))
        }
    }
}
