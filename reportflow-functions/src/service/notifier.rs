//! Alert notifier
//!
//! Turns an [`AlertPayload`] into Slack blocks and sends it, either straight
//! to the Slack Web API or through the alerting function.

use async_trait::async_trait;
use reportflow_client::{ClientError, FunctionClient, SlackClient};
use reportflow_core::domain::alert::AlertPayload;
use reportflow_core::dto::function::{AlertRequest, FunctionResponse};
use reportflow_core::dto::slack::{PostMessage, SlackResponse};
use serde_json::Value as JsonValue;
use thiserror::Error;
use tracing::info;

/// An alert could not be delivered
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("failed to send alert: {0}")]
    Send(#[source] ClientError),

    #[error("alert was rejected: {0}")]
    Rejected(String),
}

impl From<ClientError> for NotifyError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Rejected(reason) => NotifyError::Rejected(reason),
            other => NotifyError::Send(other),
        }
    }
}

/// Delivers alerts to humans
#[async_trait]
pub trait AlertNotifier: Send + Sync {
    /// Formats `payload` and performs one send
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError>;
}

/// Posts alerts directly with `chat.postMessage`
pub struct SlackNotifier {
    slack: SlackClient,
    token: String,
    channel: String,
}

impl SlackNotifier {
    pub fn new(slack: SlackClient, token: impl Into<String>, channel: impl Into<String>) -> Self {
        Self {
            slack,
            token: token.into(),
            channel: channel.into(),
        }
    }

    /// Posts already formatted blocks to the alert channel
    pub async fn send_blocks(&self, blocks: Vec<JsonValue>) -> Result<SlackResponse, NotifyError> {
        let message = PostMessage::from_bot(&self.channel, blocks);
        let response = self.slack.post_message(&self.token, &message).await?;
        info!("Slack notification sent successfully to {}", self.channel);
        Ok(response)
    }
}

#[async_trait]
impl AlertNotifier for SlackNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError> {
        self.send_blocks(payload.to_blocks()).await.map(|_| ())
    }
}

/// Sends alerts through the alerting function
pub struct RemoteNotifier {
    functions: FunctionClient,
    url: String,
    slack_oauth_token: String,
}

impl RemoteNotifier {
    pub fn new(functions: FunctionClient, url: impl Into<String>, slack_oauth_token: impl Into<String>) -> Self {
        Self {
            functions,
            url: url.into(),
            slack_oauth_token: slack_oauth_token.into(),
        }
    }
}

/// Body the alerting function expects for `payload`
pub(crate) fn alert_request(payload: &AlertPayload, slack_oauth_token: &str) -> AlertRequest {
    AlertRequest {
        client_name: payload.client_name.clone(),
        execution_id: payload.execution_id,
        slack_oauth_token: slack_oauth_token.to_string(),
        blocks: payload.to_blocks(),
    }
}

#[async_trait]
impl AlertNotifier for RemoteNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError> {
        let request = alert_request(payload, &self.slack_oauth_token);

        match self.functions.invoke(&self.url, &request).await? {
            FunctionResponse::Success(success) => {
                info!("{}", success.message);
                Ok(())
            }
            FunctionResponse::Failure(failure) => Err(NotifyError::Rejected(failure.error)),
        }
    }
}
