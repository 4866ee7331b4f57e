//! Slack Web API endpoints

use reqwest::Client;
use reportflow_core::dto::slack::{PostMessage, SlackResponse};

use crate::error::{ClientError, Result};
use crate::{handle_response, normalize_base_url};

/// Public Slack Web API
pub const DEFAULT_SLACK_API_URL: &str = "https://slack.com/api";

/// HTTP client for the Slack Web API
#[derive(Debug, Clone)]
pub struct SlackClient {
    base_url: String,
    client: Client,
}

impl SlackClient {
    pub fn new() -> Self {
        Self::with_client(DEFAULT_SLACK_API_URL, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Post a message with `chat.postMessage`
    ///
    /// Slack answers HTTP 200 even when it refuses a message; `ok: false`
    /// is turned into [`ClientError::Rejected`].
    pub async fn post_message(&self, token: &str, message: &PostMessage) -> Result<SlackResponse> {
        let url = format!("{}/chat.postMessage", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(token)
            .json(message)
            .send()
            .await?;

        let body: SlackResponse = handle_response(response).await?;
        if !body.ok {
            return Err(ClientError::Rejected(
                body.error.unwrap_or_else(|| "unknown_error".to_string()),
            ));
        }

        tracing::debug!("Slack accepted message in {}", message.channel);
        Ok(body)
    }
}

impl Default for SlackClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::serve;
    use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
    use serde_json::{Value as JsonValue, json};
    use std::sync::{Arc, Mutex};

    type Recorded = Arc<Mutex<Vec<(HeaderMap, JsonValue)>>>;

    async fn post_message(
        State(recorded): State<Recorded>,
        headers: HeaderMap,
        Json(body): Json<JsonValue>,
    ) -> Json<JsonValue> {
        let reply = if body["channel"] == "#alerts" {
            json!({ "ok": true, "ts": "1700000000.000100" })
        } else {
            json!({ "ok": false, "error": "channel_not_found" })
        };
        recorded.lock().unwrap().push((headers, body));
        Json(reply)
    }

    async fn slack() -> (SlackClient, Recorded) {
        let recorded = Recorded::default();
        let router = Router::new()
            .route("/chat.postMessage", post(post_message))
            .with_state(recorded.clone());
        let base = serve(router).await;
        (SlackClient::with_client(base, Client::new()), recorded)
    }

    #[test]
    fn test_default_points_at_slack() {
        assert_eq!(SlackClient::default().base_url(), "https://slack.com/api");
    }

    #[tokio::test]
    async fn test_post_message_uses_bearer_token() {
        let (client, recorded) = slack().await;
        let message = PostMessage::from_bot("#alerts", vec![json!({ "type": "divider" })]);

        let response = client.post_message("xoxb-token", &message).await.unwrap();

        assert!(response.ok);
        assert_eq!(response.ts.as_deref(), Some("1700000000.000100"));
        let recorded = recorded.lock().unwrap();
        let (headers, body) = &recorded[0];
        assert_eq!(headers["authorization"], "Bearer xoxb-token");
        assert_eq!(body["username"], "gcp-cloud-functions");
        assert_eq!(body["icon_emoji"], ":robot_face:");
        assert_eq!(body["blocks"][0]["type"], "divider");
    }

    #[tokio::test]
    async fn test_ok_false_is_rejected() {
        let (client, _) = slack().await;
        let message = PostMessage::from_bot("#missing", vec![json!({ "type": "divider" })]);

        let err = client.post_message("xoxb-token", &message).await.unwrap_err();

        assert!(matches!(err, ClientError::Rejected(ref reason) if reason == "channel_not_found"));
    }
}
