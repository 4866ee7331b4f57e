//! Execution context
//!
//! Identifies one run of the pipeline across every function it touches.
//! The context is passed explicitly from call to call and copied into log
//! fields and error details; nothing about a run is kept in process-wide state.

use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

/// Milliseconds since the Unix epoch at the moment the orchestrator started
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionId(i64);

impl ExecutionId {
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Generates a fresh id from the current wall clock
    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for ExecutionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-request context threaded through every call of a function
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    pub execution_id: ExecutionId,
    pub client_name: String,
    /// Human readable name of the function handling the request
    pub pipeline_phase: String,
    pub started_at: DateTime<Local>,
}

impl ExecutionContext {
    pub fn new(
        execution_id: ExecutionId,
        client_name: impl Into<String>,
        pipeline_phase: impl Into<String>,
    ) -> Self {
        Self {
            execution_id,
            client_name: client_name.into(),
            pipeline_phase: pipeline_phase.into(),
            started_at: Local::now(),
        }
    }

    /// Start time in the format used by alert messages
    pub fn start_datetime(&self) -> String {
        self.started_at.format("%Y-%m-%d %H:%M:%S").to_string()
    }

    /// Fields attached to every response detail map
    pub fn detail_fields(&self) -> Map<String, JsonValue> {
        let mut fields = Map::new();
        fields.insert(
            "pipeline_phase".to_string(),
            JsonValue::from(self.pipeline_phase.clone()),
        );
        fields.insert(
            "execution_id".to_string(),
            JsonValue::from(self.execution_id.value()),
        );
        fields.insert(
            "client_name".to_string(),
            JsonValue::from(self.client_name.clone()),
        );
        fields
    }
}
