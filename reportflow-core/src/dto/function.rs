//! Function request and response bodies
//!
//! Every function answers with one of two envelopes: `{message, details}`
//! with HTTP 200, or `{error, details}` with HTTP 400. The orchestrator reads
//! the same envelopes back from the stages it calls.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

use crate::domain::context::ExecutionId;
use crate::dto::args::{RequestArgs, ValidationError};

/// Queue endpoint used when the request does not name one
pub const DEFAULT_KEBOOLA_ENDPOINT: &str = "https://queue.north-europe.azure.keboola.com";

/// Watch deadline used when the request does not set one
pub const DEFAULT_MAX_RUNTIME_SECS: u64 = 360;

/// Log project linked from alerts when the request does not name one
pub const DEFAULT_LOGS_PROJECT: &str = "niftyminds-client-reporting";

/// Key of the alerting sub-object in an orchestrator request
pub const SLACK_NOTIFICATION_KEY: &str = "slack_notification";

/// Successful function response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSuccess {
    pub message: String,
    #[serde(default)]
    pub details: Map<String, JsonValue>,
}

/// Failed function response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionFailure {
    pub error: String,
    #[serde(default)]
    pub details: Map<String, JsonValue>,
}

impl FunctionFailure {
    /// The `job_phase` the failing function reported, if any
    pub fn job_phase(&self) -> Option<&str> {
        self.details.get("job_phase").and_then(JsonValue::as_str)
    }
}

/// Either envelope, as read back from a sibling function
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionResponse {
    Success(FunctionSuccess),
    Failure(FunctionFailure),
}

/// Body of the Keboola trigger function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerRequest {
    pub execution_id: ExecutionId,
    pub client_name: String,
    pub run_id: String,
    pub storage_api_token: String,
    pub endpoint_url: Option<String>,
    pub max_runtime_secs: Option<u64>,
}

impl TriggerRequest {
    pub fn from_args(args: &RequestArgs) -> Result<Self, ValidationError> {
        let max_runtime_secs = args.optional_u64("keboola_job_max_runtime_seconds")?;
        if max_runtime_secs == Some(0) {
            return Err(ValidationError::InvalidField {
                name: "keboola_job_max_runtime_seconds".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(Self {
            execution_id: args.required_execution_id("execution_id")?,
            client_name: args.required_str("client_name")?,
            run_id: args.required_str("keboola_orchestration_trigger_run_id")?,
            storage_api_token: args.required_str("keboola_storage_api_token")?,
            endpoint_url: args.optional_str("keboola_endpoint_url")?,
            max_runtime_secs,
        })
    }
}

/// Body of the Slack alerting function
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRequest {
    pub client_name: String,
    pub execution_id: ExecutionId,
    pub slack_oauth_token: String,
    pub blocks: Vec<JsonValue>,
}

impl AlertRequest {
    pub fn from_args(args: &RequestArgs) -> Result<Self, ValidationError> {
        let blocks = args.required_array("blocks")?;
        if blocks.is_empty() {
            return Err(ValidationError::InvalidField {
                name: "blocks".to_string(),
                reason: "must contain at least one block".to_string(),
            });
        }

        Ok(Self {
            execution_id: args.required_execution_id("execution_id")?,
            slack_oauth_token: args.required_str("slack_oauth_token")?,
            client_name: args.required_str("client_name")?,
            blocks: blocks.clone(),
        })
    }
}

/// Body of the orchestrator function
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorRequest {
    pub client_name: String,
    /// Stage key and the body forwarded to that stage, in pipeline order
    pub stages: Vec<(String, Map<String, JsonValue>)>,
    pub slack_oauth_token: String,
    pub project: Option<String>,
}

impl OrchestratorRequest {
    /// Reads the request, requiring one sub-object per key in `stage_keys`
    pub fn from_args(args: &RequestArgs, stage_keys: &[&str]) -> Result<Self, ValidationError> {
        let client_name = args.required_str("client_name")?;

        let mut stages = Vec::with_capacity(stage_keys.len());
        for key in stage_keys {
            let body = args.required_object(key)?;
            stages.push((key.to_string(), body.clone()));
        }

        let notification = RequestArgs::from_map(args.required_object(SLACK_NOTIFICATION_KEY)?.clone());
        let slack_oauth_token = notification
            .required_str("slack_oauth_token")
            .map_err(|e| match e {
                ValidationError::MissingField(name) => {
                    ValidationError::MissingField(format!("{}.{}", SLACK_NOTIFICATION_KEY, name))
                }
                other => other,
            })?;

        Ok(Self {
            client_name,
            stages,
            slack_oauth_token,
            project: args.optional_str("project")?,
        })
    }
}
