//! API Module
//!
//! HTTP surface of the functions. Each submodule hosts one function; they
//! share the response envelopes and the error type.

pub mod alert;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod trigger;

use axum::{
    Router,
    routing::{get, post},
};
use serde_json::{Map, Value as JsonValue};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Create the router with every function endpoint
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Functions
        .route("/keboola-trigger", post(trigger::keboola_trigger))
        .route("/slack-alerting", post(alert::slack_alerting))
        .route("/orchestrator", post(orchestrator::orchestrate))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Detail map with the phase fields added on top of `base`
pub fn phase_details(
    mut base: Map<String, JsonValue>,
    job_phase: &str,
    job_phase_detail: &str,
) -> Map<String, JsonValue> {
    base.insert("job_phase".to_string(), JsonValue::from(job_phase));
    base.insert("job_phase_detail".to_string(), JsonValue::from(job_phase_detail));
    base
}
