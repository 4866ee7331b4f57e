//! Job queue DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::domain::job::{JobId, JobStatus};

/// Request to start a new job
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJob {
    pub component: String,
    pub config: String,
    pub mode: String,
    pub config_row_ids: Vec<String>,
}

impl CreateJob {
    pub fn new(component: impl Into<String>, config: impl Into<String>, mode: impl Into<String>) -> Self {
        Self {
            component: component.into(),
            config: config.into(),
            mode: mode.into(),
            config_row_ids: Vec::new(),
        }
    }
}

/// Job body returned by the create and status endpoints
///
/// Every field is optional: an error response carries only `error`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobSnapshot {
    #[serde(default)]
    pub id: Option<JobId>,
    #[serde(default)]
    pub status: Option<JobStatus>,
    #[serde(default)]
    pub error: Option<JsonValue>,
}

impl JobSnapshot {
    /// The API's error detail, if the body signals one
    pub fn error_detail(&self) -> Option<String> {
        match &self.error {
            None | Some(JsonValue::Null) => None,
            Some(JsonValue::String(message)) => Some(message.clone()),
            Some(other) => Some(other.to_string()),
        }
    }
}
