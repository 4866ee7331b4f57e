//! Pipeline orchestrator
//!
//! Runs the stage functions of one pipeline execution in order. The first
//! failing stage stops the run and raises exactly one alert; later stages are
//! never called. Alerting is best-effort: a failed alert is logged and the
//! outcome stays the stage's failure.

use async_trait::async_trait;
use reportflow_client::{ClientError, FunctionClient};
use reportflow_core::domain::alert::{AlertPayload, LOGS_BASE_URL, build_logs_url};
use reportflow_core::domain::context::ExecutionContext;
use reportflow_core::dto::function::{FunctionFailure, FunctionResponse, FunctionSuccess};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;
use tracing::{Instrument, error, info, info_span, warn};

use super::notifier::AlertNotifier;

/// Error type shown in alerts raised for a failing stage
pub const COMPONENT_ERROR: &str = "Component error";

/// One stage of the pipeline
#[derive(Debug, Clone)]
pub struct StageSpec {
    /// Key of the stage's sub-object in the orchestrator request
    pub key: String,
    /// Display name, also the `pipeline_phase` of the stage's logs
    pub name: String,
    pub url: String,
    pub body: JsonValue,
}

impl StageSpec {
    /// Builds a stage whose body carries the execution's identity
    pub fn new(
        key: impl Into<String>,
        name: impl Into<String>,
        url: impl Into<String>,
        mut body: Map<String, JsonValue>,
        ctx: &ExecutionContext,
    ) -> Self {
        body.insert(
            "execution_id".to_string(),
            JsonValue::from(ctx.execution_id.value()),
        );
        body.insert(
            "client_name".to_string(),
            JsonValue::from(ctx.client_name.clone()),
        );

        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
            body: JsonValue::Object(body),
        }
    }
}

/// A stage did not succeed
#[derive(Debug, Error)]
pub enum StageError {
    #[error("failed to invoke stage: {0}")]
    Transport(#[from] ClientError),

    #[error("{}", .0.error)]
    Failed(FunctionFailure),
}

impl StageError {
    fn job_phase(&self) -> String {
        match self {
            StageError::Transport(_) => "invoke_stage".to_string(),
            StageError::Failed(failure) => failure.job_phase().unwrap_or("unknown").to_string(),
        }
    }

    /// The stage's own details merged with its error message
    fn component_error_details(&self) -> Map<String, JsonValue> {
        let mut details = match self {
            StageError::Transport(_) => Map::new(),
            StageError::Failed(failure) => failure.details.clone(),
        };
        details.insert("error".to_string(), JsonValue::from(self.to_string()));
        details
    }
}

/// Invokes one stage function
#[async_trait]
pub trait StageInvoker: Send + Sync {
    async fn invoke(&self, stage: &StageSpec) -> Result<FunctionSuccess, StageError>;
}

#[async_trait]
impl StageInvoker for FunctionClient {
    async fn invoke(&self, stage: &StageSpec) -> Result<FunctionSuccess, StageError> {
        match FunctionClient::invoke(self, &stage.url, &stage.body).await? {
            FunctionResponse::Success(success) => Ok(success),
            FunctionResponse::Failure(failure) => Err(StageError::Failed(failure)),
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, PartialEq)]
pub struct StageFailure {
    pub stage: String,
    pub message: String,
    pub component_error_details: Map<String, JsonValue>,
    pub alert_sent: bool,
}

/// Result of one orchestrated run
#[derive(Debug, Clone, PartialEq)]
pub enum OrchestrationOutcome {
    Succeeded { completed: Vec<String> },
    Failed(StageFailure),
}

/// Sequences stage functions and alerts on the first failure
pub struct Orchestrator<'a> {
    invoker: &'a dyn StageInvoker,
    notifier: &'a dyn AlertNotifier,
    logs_project: String,
}

impl<'a> Orchestrator<'a> {
    pub fn new(
        invoker: &'a dyn StageInvoker,
        notifier: &'a dyn AlertNotifier,
        logs_project: impl Into<String>,
    ) -> Self {
        Self {
            invoker,
            notifier,
            logs_project: logs_project.into(),
        }
    }

    pub async fn run(&self, ctx: &ExecutionContext, stages: &[StageSpec]) -> OrchestrationOutcome {
        let mut completed = Vec::with_capacity(stages.len());

        for stage in stages {
            let span = info_span!("stage", stage = %stage.name);
            info!(parent: &span, "Starting {}...", stage.name);

            match self.invoker.invoke(stage).instrument(span.clone()).await {
                Ok(_) => {
                    info!(
                        parent: &span,
                        "Finished {}; Execution ID: {}", stage.name, ctx.execution_id
                    );
                    completed.push(stage.name.clone());
                }
                Err(e) => {
                    let failure = self.fail(ctx, stage, &e).instrument(span).await;
                    return OrchestrationOutcome::Failed(failure);
                }
            }
        }

        OrchestrationOutcome::Succeeded { completed }
    }

    async fn fail(&self, ctx: &ExecutionContext, stage: &StageSpec, err: &StageError) -> StageFailure {
        let message = format!(
            "Error in {} for {}; Execution ID: {}",
            stage.name, ctx.client_name, ctx.execution_id
        );
        error!("{}: {}", message, err);

        let payload = self.alert_payload(ctx, stage, err, &message);
        let alert_sent = match self.notifier.notify(&payload).await {
            Ok(()) => true,
            Err(e) => {
                warn!("Sending slack message failed: {}", e);
                false
            }
        };

        StageFailure {
            stage: stage.name.clone(),
            message,
            component_error_details: err.component_error_details(),
            alert_sent,
        }
    }

    fn alert_payload(
        &self,
        ctx: &ExecutionContext,
        stage: &StageSpec,
        err: &StageError,
        message: &str,
    ) -> AlertPayload {
        AlertPayload {
            client_name: ctx.client_name.clone(),
            execution_id: ctx.execution_id,
            start_datetime: ctx.start_datetime(),
            pipeline_component: stage.name.clone(),
            job_phase: err.job_phase(),
            component_url: stage.url.clone(),
            error_type: COMPONENT_ERROR.to_string(),
            message: message.to_string(),
            message_detail: err.to_string(),
            warnerr_logs_url: build_logs_url(
                LOGS_BASE_URL,
                ctx.execution_id,
                &stage.name,
                &self.logs_project,
                false,
            ),
            full_logs_url: build_logs_url(
                LOGS_BASE_URL,
                ctx.execution_id,
                &stage.name,
                &self.logs_project,
                true,
            ),
        }
    }
}
