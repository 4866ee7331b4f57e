//! Slack Alerting API Handler
//!
//! Posts pre-formatted alert blocks to the alert channel.

use axum::{Json, body::Bytes, extract::State};
use reportflow_core::domain::context::ExecutionContext;
use reportflow_core::dto::args::RequestArgs;
use reportflow_core::dto::function::{AlertRequest, FunctionSuccess};
use reportflow_core::dto::slack::SlackResponse;
use serde_json::Value as JsonValue;
use tracing::Instrument;

use crate::api::error::{ApiError, ApiResult};
use crate::api::phase_details;
use crate::logging::execution_span;
use crate::service::{NotifyError, SlackNotifier};
use crate::state::AppState;

/// `pipeline_phase` of everything this function logs
pub const PIPELINE_PHASE: &str = "Slack notification";

/// POST /slack-alerting
pub async fn slack_alerting(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<FunctionSuccess>> {
    let args = RequestArgs::from_slice(&body)?;
    let req = AlertRequest::from_args(&args)?;

    let ctx = ExecutionContext::new(req.execution_id, req.client_name.clone(), PIPELINE_PHASE);
    let notifier = SlackNotifier::new(
        state.slack(),
        &req.slack_oauth_token,
        &state.config.slack_channel,
    );

    let result = notifier
        .send_blocks(req.blocks)
        .instrument(execution_span(&ctx))
        .await;

    send_response(&ctx, &state.config.slack_channel, result).map(Json)
}

fn send_response(
    ctx: &ExecutionContext,
    channel: &str,
    result: Result<SlackResponse, NotifyError>,
) -> ApiResult<FunctionSuccess> {
    let mut details = ctx.detail_fields();
    details.insert("channel".to_string(), JsonValue::from(channel));

    match result {
        Ok(response) => {
            if let Some(ts) = response.ts {
                details.insert("message_ts".to_string(), JsonValue::from(ts));
            }
            Ok(FunctionSuccess {
                message: "Slack notification sent successfully".to_string(),
                details: phase_details(details, "send_message", "message_sent"),
            })
        }
        Err(e) => {
            let phase_detail = match &e {
                NotifyError::Send(_) => "error_sending_message",
                NotifyError::Rejected(_) => "error_response_from_api",
            };
            Err(ApiError::failed(
                format!("Sending slack message failed: {}", e),
                phase_details(details, "send_message", phase_detail),
            ))
        }
    }
}
