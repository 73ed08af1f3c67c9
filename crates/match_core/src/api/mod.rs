pub mod json_api;

pub use json_api::{
    distribution_schema, engine_info, request_schema, result_schema, simulate_batch_json,
    simulate_batch_json_with, simulate_json, simulate_json_with, EngineInfo, SERVICE_NAME,
};
