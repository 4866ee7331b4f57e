//! Slack DTOs

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Channel alerts are posted to unless configured otherwise
pub const DEFAULT_ALERT_CHANNEL: &str = "#client-reporting-alerts";

/// `chat.postMessage` request body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostMessage {
    pub channel: String,
    pub blocks: Vec<JsonValue>,
    pub username: String,
    pub icon_emoji: String,
}

impl PostMessage {
    /// A message posted under the functions' bot identity
    pub fn from_bot(channel: impl Into<String>, blocks: Vec<JsonValue>) -> Self {
        Self {
            channel: channel.into(),
            blocks,
            username: "gcp-cloud-functions".to_string(),
            icon_emoji: ":robot_face:".to_string(),
        }
    }
}

/// Slack Web API response envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlackResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub ts: Option<String>,
}
