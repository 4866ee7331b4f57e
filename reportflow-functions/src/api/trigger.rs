//! Keboola Trigger API Handler
//!
//! Starts the orchestration trigger job for a client and watches it until it
//! finishes, times out or the server shuts down.

use axum::{Json, body::Bytes, extract::State};
use reportflow_client::QueueClient;
use reportflow_core::domain::context::ExecutionContext;
use reportflow_core::domain::outcome::WatchOutcome;
use reportflow_core::dto::args::RequestArgs;
use reportflow_core::dto::function::{
    DEFAULT_KEBOOLA_ENDPOINT, DEFAULT_MAX_RUNTIME_SECS, FunctionSuccess, TriggerRequest,
};
use serde_json::Value as JsonValue;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::phase_details;
use crate::logging::execution_span;
use crate::service::{JobQueue, JobWatcher, StageTrigger, StartJob};
use crate::state::AppState;

/// `pipeline_phase` of everything this function logs
pub const PIPELINE_PHASE: &str = "Keboola orchestration trigger";

/// POST /keboola-trigger
pub async fn keboola_trigger(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<FunctionSuccess>> {
    let args = RequestArgs::from_slice(&body)?;
    let req = TriggerRequest::from_args(&args)?;

    let ctx = ExecutionContext::new(req.execution_id, req.client_name.clone(), PIPELINE_PHASE);
    let endpoint = req
        .endpoint_url
        .as_deref()
        .unwrap_or(DEFAULT_KEBOOLA_ENDPOINT);
    let queue = QueueClient::with_client(endpoint, &req.storage_api_token, state.http.clone());
    let max_runtime =
        Duration::from_secs(req.max_runtime_secs.unwrap_or(DEFAULT_MAX_RUNTIME_SECS));

    trigger_and_watch(&queue, &ctx, &req.run_id, max_runtime, &state.shutdown)
        .instrument(execution_span(&ctx))
        .await
        .map(Json)
}

/// Starts the trigger job for `run_id` and maps its watch outcome to a response
pub(crate) async fn trigger_and_watch(
    queue: &dyn JobQueue,
    ctx: &ExecutionContext,
    run_id: &str,
    max_runtime: Duration,
    cancel: &CancellationToken,
) -> ApiResult<FunctionSuccess> {
    let mut details = ctx.detail_fields();
    details.insert(
        "keboola_orchestration_trigger_run_id".to_string(),
        JsonValue::from(run_id),
    );

    let job_id = StageTrigger::new(queue)
        .start(&StartJob::orchestration_trigger(run_id))
        .await
        .map_err(|e| {
            let phase_detail = e.phase_detail();
            ApiError::failed(
                format!(
                    "Error creating a job for orchestration trigger with id: {}: {}",
                    run_id, e
                ),
                phase_details(details.clone(), "create_job", phase_detail),
            )
        })?;

    details.insert("keboola_job_id".to_string(), JsonValue::from(job_id.as_str()));

    let outcome = JobWatcher::new(queue)
        .watch_until_cancelled(&job_id, max_runtime, cancel)
        .await;

    let job_phase_detail = match &outcome {
        WatchOutcome::Succeeded | WatchOutcome::Failed { detail: None } => "job_finished",
        WatchOutcome::Failed { detail: Some(_) } => "error_response_from_api",
        WatchOutcome::TimedOut { .. } => "job_timeout",
        WatchOutcome::TransportError { .. } => "error_checking_job",
    };
    let details = phase_details(details, "check_job_status", job_phase_detail);

    if outcome.is_success() {
        return Ok(FunctionSuccess {
            message: format!(
                "Job {} for orchestration trigger with id: {} finished successfully.",
                job_id, run_id
            ),
            details,
        });
    }

    Err(ApiError::failed(
        format!(
            "Job {} for orchestration trigger with id: {} {}.",
            job_id, run_id, outcome
        ),
        details,
    ))
}
