//! Outcome of watching a job

use std::fmt;
use std::time::Duration;

use crate::domain::job::JobStatus;

/// Terminal result of one watch
///
/// Exactly one outcome is produced per watch. Timeout and transport failures
/// are classified before the job is killed; the kill result never changes
/// the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The job reported `success`
    Succeeded,
    /// The job reported `failed` (no detail), or the queue answered with an
    /// error body (detail carries the API's error)
    Failed { detail: Option<String> },
    /// The deadline passed before the job reached a terminal status
    TimedOut {
        elapsed: Duration,
        last_status: Option<JobStatus>,
    },
    /// The status request itself failed or returned something unreadable
    TransportError { detail: String },
}

impl WatchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, WatchOutcome::Succeeded)
    }

    /// Whether the watcher had to cancel the job to produce this outcome
    pub fn requires_kill(&self) -> bool {
        match self {
            WatchOutcome::Succeeded => false,
            WatchOutcome::Failed { detail } => detail.is_some(),
            WatchOutcome::TimedOut { .. } | WatchOutcome::TransportError { .. } => true,
        }
    }
}

impl fmt::Display for WatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WatchOutcome::Succeeded => write!(f, "succeeded"),
            WatchOutcome::Failed { detail: None } => write!(f, "failed"),
            WatchOutcome::Failed {
                detail: Some(detail),
            } => write!(f, "failed: {}", detail),
            WatchOutcome::TimedOut { elapsed, .. } => {
                write!(f, "timed out after {:.2}s", elapsed.as_secs_f64())
            }
            WatchOutcome::TransportError { detail } => write!(f, "transport error: {}", detail),
        }
    }
}
