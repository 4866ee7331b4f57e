//! Reportflow HTTP Clients
//!
//! Thin, typed clients for the external APIs the client-reporting functions
//! talk to:
//! - [`QueueClient`]: the job queue (start, status, kill)
//! - [`SlackClient`]: the Slack Web API (`chat.postMessage`)
//! - [`FunctionClient`]: sibling functions of the pipeline
//!
//! # Example
//!
//! ```no_run
//! use reportflow_client::QueueClient;
//! use reportflow_core::domain::job::JobId;
//!
//! # async fn example() -> reportflow_client::Result<()> {
//! let queue = QueueClient::new("https://queue.north-europe.azure.keboola.com", "token");
//! let job = queue.get_job(&JobId::new("123")).await?;
//! println!("status: {:?}", job.status);
//! # Ok(())
//! # }
//! ```

pub mod error;
mod functions;
mod queue;
mod slack;

// Re-export commonly used types
pub use error::{ClientError, Result};
pub use functions::FunctionClient;
pub use queue::{QueueClient, RUN_ID_HEADER, STORAGE_TOKEN_HEADER};
pub use slack::{DEFAULT_SLACK_API_URL, SlackClient};

use serde::de::DeserializeOwned;

// =============================================================================
// Response Handlers
// =============================================================================

/// Handle an API response and deserialize JSON
///
/// Non-success statuses become [`ClientError::ApiError`] carrying the body.
async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();

    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::api_error(status.as_u16(), error_text));
    }

    response
        .json()
        .await
        .map_err(|e| ClientError::ParseError(format!("Failed to parse JSON response: {}", e)))
}

/// Deserialize a JSON body regardless of the status code
///
/// Used for APIs that describe failures in the body of 4xx responses. A body
/// that is not valid JSON is reported as an API error for non-success statuses
/// and as a parse error otherwise.
async fn read_json_body<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    serde_json::from_str(&body).map_err(|e| {
        if status.is_success() {
            ClientError::ParseError(format!("Failed to parse JSON response: {}", e))
        } else {
            ClientError::api_error(status.as_u16(), body)
        }
    })
}

/// Strip the trailing slash so paths can be appended with `format!`
fn normalize_base_url(base_url: impl Into<String>) -> String {
    base_url.into().trim_end_matches('/').to_string()
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(normalize_base_url("http://localhost:8080/"), "http://localhost:8080");
        assert_eq!(normalize_base_url("http://localhost:8080"), "http://localhost:8080");
    }
}
