//! Job queue seam
//!
//! The trigger and the watcher only see [`JobQueue`]; the production
//! implementation is the HTTP [`QueueClient`].

use async_trait::async_trait;
use reportflow_client::{ClientError, QueueClient};
use reportflow_core::domain::job::JobId;
use reportflow_core::dto::queue::{CreateJob, JobSnapshot};

/// Operations the functions need from the external job queue
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Starts a job and returns the raw response body
    async fn create_job(&self, req: &CreateJob, run_id: &str) -> Result<JobSnapshot, ClientError>;

    /// Reads the current state of a job
    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ClientError>;

    /// Asks the queue to kill a job
    async fn kill_job(&self, job_id: &JobId) -> Result<(), ClientError>;
}

#[async_trait]
impl JobQueue for QueueClient {
    async fn create_job(&self, req: &CreateJob, run_id: &str) -> Result<JobSnapshot, ClientError> {
        QueueClient::create_job(self, req, run_id).await
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ClientError> {
        self.get_job(job_id).await
    }

    async fn kill_job(&self, job_id: &JobId) -> Result<(), ClientError> {
        QueueClient::kill_job(self, job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::JobWatcher;
    use crate::service::testing::serve;
    use axum::{
        Json, Router,
        extract::State,
        http::StatusCode,
        routing::{get, post},
    };
    use reportflow_core::domain::outcome::WatchOutcome;
    use serde_json::json;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::time::Duration;

    #[tokio::test]
    async fn test_error_body_on_status_fails_and_kills_once() {
        let kills = Arc::new(AtomicUsize::new(0));
        let router = Router::new()
            .route(
                "/jobs/{id}",
                get(|| async {
                    (
                        StatusCode::NOT_FOUND,
                        Json(json!({ "error": "Job not found", "code": 404 })),
                    )
                }),
            )
            .route(
                "/jobs/{id}/kill",
                post(|State(kills): State<Arc<AtomicUsize>>| async move {
                    kills.fetch_add(1, Ordering::SeqCst);
                    StatusCode::OK
                }),
            )
            .with_state(kills.clone());
        let queue = QueueClient::new(serve(router).await, "secret");

        let outcome = JobWatcher::new(&queue)
            .watch(&JobId::new("1234"), Duration::from_secs(60))
            .await;

        assert_eq!(
            outcome,
            WatchOutcome::Failed {
                detail: Some("Job not found".to_string())
            }
        );
        assert_eq!(kills.load(Ordering::SeqCst), 1);
    }
}
