use std::env;

use super::EngineConfig;
use crate::error::{EngineError, Result};

/// Path to a YAML [`EngineConfig`]; unset or empty means built-in defaults.
pub const CONFIG_PATH_ENV: &str = "MATCH_ENGINE_CONFIG";
/// Worker-count override applied on top of the loaded config.
pub const WORKERS_ENV: &str = "MATCH_ENGINE_WORKERS";

impl EngineConfig {
    /// Load from [`CONFIG_PATH_ENV`] and apply [`WORKERS_ENV`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(CONFIG_PATH_ENV) {
            Some(path) if !path.trim().is_empty() => {
                let path = path.trim();
                tracing::debug!(path, "loading engine config");
                Self::from_yaml_file(path)?
            }
            _ => Self::default(),
        };

        config.apply_overrides_from(&lookup)?;
        Ok(config)
    }

    /// Apply [`WORKERS_ENV`] to an already loaded config, whatever its
    /// source. `lookup` reads a variable, e.g. `|key| std::env::var(key).ok()`.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(raw) = lookup(WORKERS_ENV) {
            let raw = raw.trim();
            if !raw.is_empty() {
                self.runner.workers = raw.parse().map_err(|e| {
                    EngineError::Configuration(format!("{WORKERS_ENV}='{raw}' is not a count: {e}"))
                })?;
            }
        }
        Ok(())
    }
}
