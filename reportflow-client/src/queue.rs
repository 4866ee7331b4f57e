//! Job queue API endpoints

use reqwest::{Client, StatusCode};
use reportflow_core::domain::job::JobId;
use reportflow_core::dto::queue::{CreateJob, JobSnapshot};
use std::fmt;

use crate::error::{ClientError, Result};
use crate::{normalize_base_url, read_json_body};

/// Header carrying the storage API token
pub const STORAGE_TOKEN_HEADER: &str = "X-StorageApi-Token";

/// Header tagging a job with the run it belongs to
pub const RUN_ID_HEADER: &str = "X-KBC-RunId";

/// HTTP client for the job queue API
#[derive(Clone)]
pub struct QueueClient {
    /// Base URL of the queue (e.g., "https://queue.north-europe.azure.keboola.com")
    base_url: String,
    /// Storage API token sent with every request
    token: String,
    /// HTTP client instance
    client: Client,
}

impl QueueClient {
    /// Create a new queue client
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self::with_client(base_url, token, Client::new())
    }

    /// Create a new queue client sharing an existing HTTP client
    pub fn with_client(base_url: impl Into<String>, token: impl Into<String>, client: Client) -> Self {
        Self {
            base_url: normalize_base_url(base_url),
            token: token.into(),
            client,
        }
    }

    /// Get the base URL of the queue
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a job
    ///
    /// The body is returned as-is; an `error` field in it is left for the
    /// caller to interpret.
    pub async fn create_job(&self, req: &CreateJob, run_id: &str) -> Result<JobSnapshot> {
        let url = format!("{}/jobs", self.base_url);
        let response = self
            .client
            .post(&url)
            .header(STORAGE_TOKEN_HEADER, &self.token)
            .header(RUN_ID_HEADER, run_id)
            .json(req)
            .send()
            .await?;

        read_json_body(response).await
    }

    /// Get the current state of a job
    pub async fn get_job(&self, job_id: &JobId) -> Result<JobSnapshot> {
        let url = format!("{}/jobs/{}", self.base_url, job_id);
        let response = self
            .client
            .get(&url)
            .header(STORAGE_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        read_json_body(response).await
    }

    /// Ask the queue to kill a job
    ///
    /// Only HTTP 200 counts as success.
    pub async fn kill_job(&self, job_id: &JobId) -> Result<()> {
        let url = format!("{}/jobs/{}/kill", self.base_url, job_id);
        let response = self
            .client
            .post(&url)
            .header(STORAGE_TOKEN_HEADER, &self.token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ClientError::api_error(status.as_u16(), error_text));
        }

        Ok(())
    }
}

impl fmt::Debug for QueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueClient")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .finish()
    }
}
