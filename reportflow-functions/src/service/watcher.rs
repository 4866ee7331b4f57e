//! Job status watcher
//!
//! Polls a queue job until it reaches a terminal status or the deadline
//! passes. Whether the job is killed afterwards is decided by
//! [`WatchOutcome::requires_kill`]: every exit other than a natural
//! `success`/`failed` kills it exactly once, and the kill result is only
//! logged.

use reportflow_core::domain::job::{JobId, JobStatus};
use reportflow_core::domain::outcome::WatchOutcome;
use reportflow_core::dto::function::DEFAULT_MAX_RUNTIME_SECS;
use tokio::time::{self, Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::queue::JobQueue;

/// Pause between two status requests
pub const POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Deadline applied when the caller does not set one
pub const DEFAULT_MAX_RUNTIME: Duration = Duration::from_secs(DEFAULT_MAX_RUNTIME_SECS);

/// Progress is logged whenever the elapsed whole seconds hit a multiple of this
const PROGRESS_LOG_EVERY_SECS: u64 = 30;

/// A job owned by the watcher for the duration of one watch
struct WatchedJob<'a> {
    id: &'a JobId,
    started_at: Instant,
}

impl<'a> WatchedJob<'a> {
    fn new(id: &'a JobId) -> Self {
        Self {
            id,
            started_at: Instant::now(),
        }
    }

    fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}

/// Watches queue jobs until they finish
pub struct JobWatcher<'a> {
    queue: &'a dyn JobQueue,
}

impl<'a> JobWatcher<'a> {
    pub fn new(queue: &'a dyn JobQueue) -> Self {
        Self { queue }
    }

    /// Polls `job_id` until it is terminal or `max_runtime` has elapsed
    pub async fn watch(&self, job_id: &JobId, max_runtime: Duration) -> WatchOutcome {
        self.watch_until_cancelled(job_id, max_runtime, &CancellationToken::new())
            .await
    }

    /// Like [`watch`](Self::watch), but also stops early when `cancel` fires
    ///
    /// A cancelled watch ends like a timed out one: the job is killed and
    /// `TimedOut` is reported with the time spent so far.
    pub async fn watch_until_cancelled(
        &self,
        job_id: &JobId,
        max_runtime: Duration,
        cancel: &CancellationToken,
    ) -> WatchOutcome {
        let job = WatchedJob::new(job_id);
        info!("Checking the status of the job with id: {}", job.id);

        let outcome = self.poll(&job, max_runtime, cancel).await;
        if outcome.requires_kill() {
            self.kill(job.id).await;
        }

        outcome
    }

    /// Polls until the job settles; never kills
    async fn poll(
        &self,
        job: &WatchedJob<'_>,
        max_runtime: Duration,
        cancel: &CancellationToken,
    ) -> WatchOutcome {
        let mut last_status: Option<JobStatus> = None;

        while job.elapsed() < max_runtime {
            let elapsed = job.elapsed();

            let snapshot = match self.queue.job_status(job.id).await {
                Ok(snapshot) => snapshot,
                Err(e) => {
                    error!("Failed to check the status of the job with id: {}: {}", job.id, e);
                    return WatchOutcome::TransportError {
                        detail: e.to_string(),
                    };
                }
            };

            let secs = elapsed.as_secs();
            if secs != 0 && secs % PROGRESS_LOG_EVERY_SECS == 0 {
                info!(
                    "Job ({}) status check... Time elapsed: {:.2} seconds.",
                    job.id,
                    elapsed.as_secs_f64()
                );
            }

            if let Some(detail) = snapshot.error_detail() {
                error!(
                    "The queue reported an error for the job with id: {}: {}",
                    job.id, detail
                );
                return WatchOutcome::Failed {
                    detail: Some(detail),
                };
            }

            let Some(status) = snapshot.status else {
                error!("Status response for the job with id: {} has no status", job.id);
                return WatchOutcome::TransportError {
                    detail: "status response did not contain a status".to_string(),
                };
            };

            if status.is_terminal() {
                if status == JobStatus::Success {
                    info!("The job with id: {} finished with status: success.", job.id);
                    return WatchOutcome::Succeeded;
                }
                warn!("The job with id: {} finished with status: {}.", job.id, status);
                return WatchOutcome::Failed { detail: None };
            }

            debug!("Job {} is {}, checking again in {:?}", job.id, status, POLL_INTERVAL);
            last_status = Some(status);

            tokio::select! {
                _ = time::sleep(POLL_INTERVAL) => {}
                _ = cancel.cancelled() => {
                    warn!("Watch of job {} cancelled", job.id);
                    break;
                }
            }
        }

        warn!(
            "Job with ID: {} was terminated due to timeout = {} seconds.",
            job.id,
            max_runtime.as_secs()
        );

        WatchOutcome::TimedOut {
            elapsed: job.elapsed(),
            last_status,
        }
    }

    /// One kill attempt; the result is only logged
    async fn kill(&self, job_id: &JobId) {
        info!("Killing job with ID: {}.", job_id);
        match self.queue.kill_job(job_id).await {
            Ok(()) => info!("Job with ID: {} killed successfully.", job_id),
            Err(e) => error!("Failed to kill job with ID: {}: {}", job_id, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::{Poll, ScriptedQueue};

    fn job() -> JobId {
        JobId::new("1234")
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_is_not_killed() {
        let queue = ScriptedQueue::new(vec![
            Poll::Status("waiting"),
            Poll::Status("processing"),
            Poll::Status("success"),
        ]);

        let outcome = JobWatcher::new(&queue).watch(&job(), DEFAULT_MAX_RUNTIME).await;

        assert_eq!(outcome, WatchOutcome::Succeeded);
        assert_eq!(queue.status_calls(), 3);
        assert_eq!(queue.kill_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_natural_failure_is_not_killed() {
        let queue = ScriptedQueue::new(vec![Poll::Status("processing"), Poll::Status("failed")]);

        let outcome = JobWatcher::new(&queue).watch(&job(), DEFAULT_MAX_RUNTIME).await;

        assert_eq!(outcome, WatchOutcome::Failed { detail: None });
        assert_eq!(queue.kill_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_kills_once() {
        let queue = ScriptedQueue::new(vec![Poll::Status("waiting"), Poll::Status("processing")]);
        let max_runtime = Duration::from_secs(60);
        let started = Instant::now();

        let outcome = JobWatcher::new(&queue).watch(&job(), max_runtime).await;

        let WatchOutcome::TimedOut {
            elapsed,
            last_status,
        } = &outcome
        else {
            panic!("expected a timeout, got {:?}", outcome);
        };
        assert!(*elapsed >= max_runtime);
        assert!(*elapsed < max_runtime + POLL_INTERVAL);
        assert!(started.elapsed() < max_runtime + POLL_INTERVAL);
        assert_eq!(last_status, &Some(JobStatus::Processing));
        assert_eq!(queue.status_calls(), 6);
        assert_eq!(queue.kill_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_check_is_strict() {
        // Polls at 0s and 10s; the check at exactly 20s stops the loop.
        let queue = ScriptedQueue::new(vec![Poll::Status("processing")]);

        let outcome = JobWatcher::new(&queue)
            .watch(&job(), Duration::from_secs(20))
            .await;

        assert!(matches!(outcome, WatchOutcome::TimedOut { .. }));
        assert_eq!(queue.status_calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_status_keeps_polling() {
        let queue = ScriptedQueue::new(vec![
            Poll::Status("warming-up"),
            Poll::Status("terminating"),
            Poll::Status("success"),
        ]);

        let outcome = JobWatcher::new(&queue).watch(&job(), DEFAULT_MAX_RUNTIME).await;

        assert_eq!(outcome, WatchOutcome::Succeeded);
        assert_eq!(queue.status_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transport_error_on_first_poll_kills_once() {
        let queue = ScriptedQueue::new(vec![Poll::Transport("connection reset")]);

        let outcome = JobWatcher::new(&queue)
            .watch(&job(), Duration::from_secs(3600))
            .await;

        assert!(matches!(outcome, WatchOutcome::TransportError { ref detail } if detail.contains("connection reset")));
        assert_eq!(queue.status_calls(), 1);
        assert_eq!(queue.kill_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_error_body_fails_with_detail_and_kills() {
        let queue = ScriptedQueue::new(vec![Poll::Status("processing"), Poll::ErrorBody("Job not found")]);

        let outcome = JobWatcher::new(&queue).watch(&job(), DEFAULT_MAX_RUNTIME).await;

        assert_eq!(
            outcome,
            WatchOutcome::Failed {
                detail: Some("Job not found".to_string())
            }
        );
        assert_eq!(queue.kill_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_kill_does_not_change_outcome() {
        let queue = ScriptedQueue::new(vec![Poll::Status("processing")]).failing_kill();

        let outcome = JobWatcher::new(&queue)
            .watch(&job(), Duration::from_secs(30))
            .await;

        assert!(matches!(outcome, WatchOutcome::TimedOut { .. }));
        assert_eq!(queue.kill_calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_terminal_job_is_idempotent() {
        let queue = ScriptedQueue::new(vec![Poll::Status("failed")]);
        let watcher = JobWatcher::new(&queue);

        for _ in 0..3 {
            assert_eq!(
                watcher.watch(&job(), DEFAULT_MAX_RUNTIME).await,
                WatchOutcome::Failed { detail: None }
            );
        }
        assert_eq!(queue.status_calls(), 3);
        assert_eq!(queue.kill_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_kills_and_reports_timeout() {
        let queue = ScriptedQueue::new(vec![Poll::Status("processing")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = JobWatcher::new(&queue)
            .watch_until_cancelled(&job(), DEFAULT_MAX_RUNTIME, &cancel)
            .await;

        let WatchOutcome::TimedOut { elapsed, .. } = &outcome else {
            panic!("expected a timeout, got {:?}", outcome);
        };
        assert!(*elapsed < POLL_INTERVAL);
        assert_eq!(queue.status_calls(), 1);
        assert_eq!(queue.kill_calls(), 1);
    }
}
