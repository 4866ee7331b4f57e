//! Alert domain types
//!
//! An alert is raised once per failed pipeline execution and rendered as a
//! list of Slack blocks.

use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

use crate::domain::context::ExecutionId;

/// Base URL of the log explorer linked from alerts
pub const LOGS_BASE_URL: &str = "https://console.cloud.google.com/logs/query";

/// How far back the linked log query looks
const LOGS_QUERY_DURATION: &str = "P7D";

/// Everything a human needs to start investigating a failed stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertPayload {
    pub client_name: String,
    pub execution_id: ExecutionId,
    pub start_datetime: String,
    pub pipeline_component: String,
    pub job_phase: String,
    pub component_url: String,
    pub error_type: String,
    pub message: String,
    pub message_detail: String,
    pub warnerr_logs_url: String,
    pub full_logs_url: String,
}

impl AlertPayload {
    /// Renders the alert as Slack `mrkdwn` blocks
    pub fn to_blocks(&self) -> Vec<JsonValue> {
        vec![
            section(format!("[{}] 🚨 {}", self.start_datetime, self.message)),
            divider(),
            section("⚙️ *Basic information*".to_string()),
            divider(),
            section(format!("*Client name:* {}", self.client_name)),
            section(format!("*Execution ID:* {}", self.execution_id)),
            section(format!("*Pipeline component:* {}", self.pipeline_component)),
            section(format!("*Pipeline phase:* {}", self.job_phase)),
            divider(),
            section("❌ *Error details*".to_string()),
            divider(),
            section(format!("*Error type:* {}", self.error_type)),
            section(format!("*Error message:* {}\n", self.message_detail)),
            divider(),
            section("🔗 *Links*".to_string()),
            divider(),
            section(format!("<{}|*Link to failed component*>", self.component_url)),
            section(format!(
                "<{}|*Link to logs in GCP (warning and higher)*>",
                self.warnerr_logs_url
            )),
            section(format!(
                "<{}|*Link to _all_ logs for the execution in GCP*>\n\n",
                self.full_logs_url
            )),
        ]
    }
}

fn section(text: String) -> JsonValue {
    json!({
        "type": "section",
        "text": {
            "type": "mrkdwn",
            "text": text,
        }
    })
}

fn divider() -> JsonValue {
    json!({ "type": "divider" })
}

/// Builds a log explorer link filtered to one execution and pipeline phase
///
/// With `complete == false` the query is narrowed to `WARNING` and above.
pub fn build_logs_url(
    base_url: &str,
    execution_id: ExecutionId,
    pipeline_phase: &str,
    project: &str,
    complete: bool,
) -> String {
    let mut query = format!(
        "jsonPayload.execution_id={}\njsonPayload.pipeline_phase=\"{}\"",
        execution_id, pipeline_phase
    );
    if !complete {
        query.push_str("\nseverity >= \"WARNING\"");
    }

    format!(
        "{};query={};duration={}?project={}",
        base_url,
        quote(&query),
        LOGS_QUERY_DURATION,
        project
    )
}

/// Percent-encodes everything except unreserved characters and `/`
fn quote(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'.' | b'-' | b'~' | b'/' => {
                encoded.push(byte as char)
            }
            other => encoded.push_str(&format!("%{:02X}", other)),
        }
    }
    encoded
}
