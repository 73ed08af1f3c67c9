//! JSON entry points for transport-layer callers
//!
//! Requests and responses use the serde encodings of [`MatchRequest`],
//! [`MatchResult`] and [`MatchDistribution`]. `simulate_json` and
//! `simulate_batch_json` take the engine configuration from the environment
//! (see [`EngineConfig::from_env`]); the `_with` variants run on an engine the
//! caller keeps.

use schemars::schema::RootSchema;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::engine::{MatchEngine, RatingModel};
use crate::error::Result;
use crate::models::{MatchDistribution, MatchRequest, MatchResult};

pub const SERVICE_NAME: &str = "match-engine";

/// Health/identity payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EngineInfo {
    pub status: String,
    pub service: String,
    pub version: String,
}

pub fn engine_info() -> EngineInfo {
    EngineInfo {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: crate::VERSION.to_string(),
    }
}

fn engine_from_env() -> Result<MatchEngine> {
    MatchEngine::new(EngineConfig::from_env()?)
}

/// Single trial from a JSON [`MatchRequest`]; returns a JSON [`MatchResult`].
///
/// Each call re-reads the environment and builds a fresh engine with its own
/// worker pool. Callers serving many requests should hold a [`MatchEngine`]
/// and use [`simulate_json_with`].
pub fn simulate_json(request_json: &str) -> Result<String> {
    simulate_json_with(&engine_from_env()?, request_json)
}

/// Batch from a JSON [`MatchRequest`]; returns a JSON [`MatchDistribution`].
///
/// Builds a fresh engine per call, like [`simulate_json`]; see
/// [`simulate_batch_json_with`].
pub fn simulate_batch_json(request_json: &str) -> Result<String> {
    simulate_batch_json_with(&engine_from_env()?, request_json)
}

pub fn simulate_json_with<M: RatingModel>(engine: &MatchEngine<M>, request_json: &str) -> Result<String> {
    let request: MatchRequest = serde_json::from_str(request_json)?;
    let result = engine.simulate(&request)?;
    Ok(serde_json::to_string(&result)?)
}

pub fn simulate_batch_json_with<M: RatingModel>(
    engine: &MatchEngine<M>,
    request_json: &str,
) -> Result<String> {
    let request: MatchRequest = serde_json::from_str(request_json)?;
    let distribution = engine.simulate_batch(&request)?;
    Ok(serde_json::to_string(&distribution)?)
}

pub fn request_schema() -> RootSchema {
    schema_for!(MatchRequest)
}

pub fn result_schema() -> RootSchema {
    schema_for!(MatchResult)
}

pub fn distribution_schema() -> RootSchema {
    schema_for!(MatchDistribution)
}
