//! Stage trigger
//!
//! Starts a job in the queue and hands back its id. No retries: a failed
//! start is reported to the caller immediately.

use reportflow_client::ClientError;
use reportflow_core::domain::job::JobId;
use reportflow_core::dto::queue::CreateJob;
use thiserror::Error;
use tracing::{error, info};

use super::queue::JobQueue;

/// Queue component that runs an orchestration
pub const ORCHESTRATION_TRIGGER_COMPONENT: &str = "kds-team.app-orchestration-trigger-queue-v2";

/// Queue run mode
pub const RUN_MODE: &str = "run";

/// A job could not be started
#[derive(Debug, Error)]
pub enum StartError {
    #[error("failed to reach the queue: {0}")]
    Transport(#[source] ClientError),

    #[error("the queue refused to start the job: {0}")]
    Rejected(String),

    #[error("the queue response did not contain a job id")]
    MissingJobId,
}

impl StartError {
    /// Value for the `job_phase_detail` field of the error response
    pub fn phase_detail(&self) -> &'static str {
        match self {
            StartError::Transport(_) => "error_creating_job",
            StartError::Rejected(_) | StartError::MissingJobId => "error_response_from_api",
        }
    }
}

/// Parameters of one job start
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartJob {
    pub component: String,
    pub config: String,
    pub mode: String,
    /// Run identifier the job is tagged with
    pub run_id: String,
}

impl StartJob {
    /// Runs the orchestration configured under `run_id`
    pub fn orchestration_trigger(run_id: impl Into<String>) -> Self {
        let run_id = run_id.into();
        Self {
            component: ORCHESTRATION_TRIGGER_COMPONENT.to_string(),
            config: run_id.clone(),
            mode: RUN_MODE.to_string(),
            run_id,
        }
    }
}

/// Starts jobs in the queue
pub struct StageTrigger<'a> {
    queue: &'a dyn JobQueue,
}

impl<'a> StageTrigger<'a> {
    pub fn new(queue: &'a dyn JobQueue) -> Self {
        Self { queue }
    }

    pub async fn start(&self, params: &StartJob) -> Result<JobId, StartError> {
        info!(
            "Creating a job for orchestration trigger with id: {}",
            params.run_id
        );

        let request = CreateJob::new(&params.component, &params.config, &params.mode);
        let snapshot = self
            .queue
            .create_job(&request, &params.run_id)
            .await
            .map_err(|e| {
                error!(
                    "Exception in create_job for orchestration trigger with id: {}: {}",
                    params.run_id, e
                );
                StartError::Transport(e)
            })?;

        if let Some(detail) = snapshot.error_detail() {
            error!(
                "The queue refused to start a job for orchestration trigger with id: {}: {}",
                params.run_id, detail
            );
            return Err(StartError::Rejected(detail));
        }

        let job_id = snapshot
            .id
            .filter(|id| !id.is_empty())
            .ok_or(StartError::MissingJobId)?;

        info!("Job {} created", job_id);
        Ok(job_id)
    }
}
