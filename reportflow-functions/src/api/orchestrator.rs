//! Orchestrator API Handler
//!
//! Entry point of one pipeline execution: assigns the execution id, runs
//! the configured stages in order and alerts on the first failure.

use axum::{Json, body::Bytes, extract::State};
use reportflow_core::domain::context::{ExecutionContext, ExecutionId};
use reportflow_core::dto::args::RequestArgs;
use reportflow_core::dto::function::{FunctionSuccess, OrchestratorRequest};
use serde_json::{Map, Value as JsonValue};
use tracing::Instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::phase_details;
use crate::config::Config;
use crate::logging::execution_span;
use crate::service::{
    AlertNotifier, OrchestrationOutcome, Orchestrator, RemoteNotifier, SlackNotifier, StageSpec,
};
use crate::state::AppState;

/// `pipeline_phase` of everything this function logs
pub const PIPELINE_PHASE: &str = "Client reporting orchestrator";

/// POST /orchestrator
pub async fn orchestrate(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<FunctionSuccess>> {
    let args = RequestArgs::from_slice(&body)?;
    let req = OrchestratorRequest::from_args(&args, &state.config.stage_keys())?;

    let ctx = ExecutionContext::new(ExecutionId::now(), req.client_name.clone(), PIPELINE_PHASE);
    let stages = stage_specs(&state.config, &ctx, req.stages);

    let invoker = state.stages();
    let notifier: Box<dyn AlertNotifier> = match &state.config.slack_alerting_url {
        Some(url) => Box::new(RemoteNotifier::new(
            state.functions(),
            url,
            &req.slack_oauth_token,
        )),
        None => Box::new(SlackNotifier::new(
            state.slack(),
            &req.slack_oauth_token,
            &state.config.slack_channel,
        )),
    };
    let project = req
        .project
        .unwrap_or_else(|| state.config.logs_project.clone());

    let outcome = Orchestrator::new(&invoker, notifier.as_ref(), project)
        .run(&ctx, &stages)
        .instrument(execution_span(&ctx))
        .await;

    outcome_response(&ctx, outcome).map(Json)
}

/// Pairs every configured stage with its body from the request
fn stage_specs(
    config: &Config,
    ctx: &ExecutionContext,
    bodies: Vec<(String, Map<String, JsonValue>)>,
) -> Vec<StageSpec> {
    config
        .stages
        .iter()
        .zip(bodies)
        .map(|(endpoint, (_, body))| {
            StageSpec::new(&endpoint.key, &endpoint.name, &endpoint.url, body, ctx)
        })
        .collect()
}

fn outcome_response(
    ctx: &ExecutionContext,
    outcome: OrchestrationOutcome,
) -> ApiResult<FunctionSuccess> {
    let mut details = ctx.detail_fields();

    match outcome {
        OrchestrationOutcome::Succeeded { completed } => {
            details.insert("completed_stages".to_string(), JsonValue::from(completed));
            Ok(FunctionSuccess {
                message: format!(
                    "Client reporting for {} finished successfully; Execution ID: {}",
                    ctx.client_name, ctx.execution_id
                ),
                details: phase_details(details, "run_stages", "stages_finished"),
            })
        }
        OrchestrationOutcome::Failed(failure) => {
            details.insert("failed_stage".to_string(), JsonValue::from(failure.stage));
            details.insert(
                "component_error_details".to_string(),
                JsonValue::Object(failure.component_error_details),
            );
            details.insert("alert_sent".to_string(), JsonValue::from(failure.alert_sent));
            Err(ApiError::failed(
                failure.message,
                phase_details(details, "run_stages", "stage_failed"),
            ))
        }
    }
}
