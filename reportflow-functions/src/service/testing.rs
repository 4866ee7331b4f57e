//! In-memory fakes for the service seams

use async_trait::async_trait;
use reportflow_client::ClientError;
use reportflow_core::domain::alert::AlertPayload;
use reportflow_core::domain::job::{JobId, JobStatus};
use reportflow_core::dto::function::{FunctionFailure, FunctionSuccess};
use reportflow_core::dto::queue::{CreateJob, JobSnapshot};
use serde_json::{Map, Value as JsonValue};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::{AlertNotifier, JobQueue, NotifyError, StageError, StageInvoker, StageSpec};

/// Serves `router` on an ephemeral local port and returns its base URL
pub(crate) async fn serve(router: axum::Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// One scripted answer of the status endpoint
#[derive(Debug, Clone, Copy)]
pub(crate) enum Poll {
    Status(&'static str),
    ErrorBody(&'static str),
    Transport(&'static str),
}

/// Scripted answer of the create endpoint
#[derive(Debug, Clone, Copy)]
pub(crate) enum CreateReply {
    Id(&'static str),
    ErrorBody(&'static str),
    Transport(&'static str),
    NoId,
}

/// Queue that replays a fixed script of status answers
///
/// Once the script runs out, the last answer repeats forever.
pub(crate) struct ScriptedQueue {
    create: CreateReply,
    polls: Mutex<VecDeque<Poll>>,
    last: Mutex<Poll>,
    kill_fails: bool,
    status_calls: AtomicUsize,
    kill_calls: AtomicUsize,
    pub(crate) created: Mutex<Vec<(CreateJob, String)>>,
}

impl ScriptedQueue {
    pub(crate) fn new(polls: Vec<Poll>) -> Self {
        let last = polls.last().copied().unwrap_or(Poll::Status("processing"));
        Self {
            create: CreateReply::Id("1234"),
            polls: Mutex::new(polls.into()),
            last: Mutex::new(last),
            kill_fails: false,
            status_calls: AtomicUsize::new(0),
            kill_calls: AtomicUsize::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn with_create(mut self, reply: CreateReply) -> Self {
        self.create = reply;
        self
    }

    pub(crate) fn failing_kill(mut self) -> Self {
        self.kill_fails = true;
        self
    }

    pub(crate) fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn kill_calls(&self) -> usize {
        self.kill_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobQueue for ScriptedQueue {
    async fn create_job(&self, req: &CreateJob, run_id: &str) -> Result<JobSnapshot, ClientError> {
        self.created
            .lock()
            .unwrap()
            .push((req.clone(), run_id.to_string()));

        match self.create {
            CreateReply::Id(id) => Ok(JobSnapshot {
                id: Some(JobId::new(id)),
                status: Some(JobStatus::Created),
                error: None,
            }),
            CreateReply::ErrorBody(message) => Ok(JobSnapshot {
                error: Some(JsonValue::from(message)),
                ..Default::default()
            }),
            CreateReply::Transport(message) => Err(ClientError::ParseError(message.to_string())),
            CreateReply::NoId => Ok(JobSnapshot::default()),
        }
    }

    async fn job_status(&self, job_id: &JobId) -> Result<JobSnapshot, ClientError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        let poll = match self.polls.lock().unwrap().pop_front() {
            Some(poll) => {
                *self.last.lock().unwrap() = poll;
                poll
            }
            None => *self.last.lock().unwrap(),
        };

        match poll {
            Poll::Status(status) => Ok(JobSnapshot {
                id: Some(job_id.clone()),
                status: Some(JobStatus::from(status.to_string())),
                error: None,
            }),
            Poll::ErrorBody(message) => Ok(JobSnapshot {
                error: Some(JsonValue::from(message)),
                ..Default::default()
            }),
            Poll::Transport(message) => Err(ClientError::ParseError(message.to_string())),
        }
    }

    async fn kill_job(&self, _job_id: &JobId) -> Result<(), ClientError> {
        self.kill_calls.fetch_add(1, Ordering::SeqCst);
        if self.kill_fails {
            return Err(ClientError::api_error(500, "kill failed"));
        }
        Ok(())
    }
}

/// Notifier that records every payload it is asked to send
#[derive(Default)]
pub(crate) struct RecordingNotifier {
    fails: bool,
    pub(crate) sent: Mutex<Vec<AlertPayload>>,
}

impl RecordingNotifier {
    pub(crate) fn failing() -> Self {
        Self {
            fails: true,
            sent: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn sent(&self) -> Vec<AlertPayload> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertNotifier for RecordingNotifier {
    async fn notify(&self, payload: &AlertPayload) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(payload.clone());
        if self.fails {
            return Err(NotifyError::Rejected("channel_not_found".to_string()));
        }
        Ok(())
    }
}

/// Stage invoker with a fixed answer per stage key
///
/// Stages without an answer succeed.
#[derive(Default)]
pub(crate) struct ScriptedInvoker {
    failures: HashMap<String, StageAnswer>,
    pub(crate) invoked: Mutex<Vec<StageSpec>>,
}

#[derive(Debug, Clone)]
enum StageAnswer {
    Failure(FunctionFailure),
    Unreachable(&'static str),
}

impl ScriptedInvoker {
    pub(crate) fn failing(mut self, key: &str, error: &str, job_phase: &str) -> Self {
        let mut details = Map::new();
        details.insert("job_phase".to_string(), JsonValue::from(job_phase));
        self.failures.insert(
            key.to_string(),
            StageAnswer::Failure(FunctionFailure {
                error: error.to_string(),
                details,
            }),
        );
        self
    }

    pub(crate) fn unreachable(mut self, key: &str, message: &'static str) -> Self {
        self.failures
            .insert(key.to_string(), StageAnswer::Unreachable(message));
        self
    }

    pub(crate) fn invoked_keys(&self) -> Vec<String> {
        self.invoked
            .lock()
            .unwrap()
            .iter()
            .map(|stage| stage.key.clone())
            .collect()
    }
}

#[async_trait]
impl StageInvoker for ScriptedInvoker {
    async fn invoke(&self, stage: &StageSpec) -> Result<FunctionSuccess, StageError> {
        self.invoked.lock().unwrap().push(stage.clone());

        match self.failures.get(&stage.key) {
            Some(StageAnswer::Failure(failure)) => Err(StageError::Failed(failure.clone())),
            Some(StageAnswer::Unreachable(message)) => Err(StageError::Transport(
                ClientError::ParseError(message.to_string()),
            )),
            None => Ok(FunctionSuccess {
                message: format!("{} finished", stage.name),
                details: Map::new(),
            }),
        }
    }
}
