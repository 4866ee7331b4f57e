//! Job domain types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a job in the external queue
///
/// The queue hands out either numbers or strings depending on the API
/// version, so the id is kept as its textual rendering.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "RawJobId", into = "String")]
pub struct JobId(String);

#[derive(Deserialize)]
#[serde(untagged)]
enum RawJobId {
    Text(String),
    Number(serde_json::Number),
}

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl From<RawJobId> for JobId {
    fn from(raw: RawJobId) -> Self {
        match raw {
            RawJobId::Text(text) => Self(text),
            RawJobId::Number(number) => Self(number.to_string()),
        }
    }
}

impl From<JobId> for String {
    fn from(id: JobId) -> Self {
        id.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Job status as reported by the queue
///
/// Only `success` and `failed` are terminal. The queue may introduce new
/// values at any time; those land in `Other` and keep the watcher polling.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Created,
    Waiting,
    Processing,
    Terminating,
    Success,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Created => "created",
            JobStatus::Waiting => "waiting",
            JobStatus::Processing => "processing",
            JobStatus::Terminating => "terminating",
            JobStatus::Success => "success",
            JobStatus::Failed => "failed",
            JobStatus::Other(status) => status,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(status: String) -> Self {
        match status.as_str() {
            "created" => JobStatus::Created,
            "waiting" => JobStatus::Waiting,
            "processing" => JobStatus::Processing,
            "terminating" => JobStatus::Terminating,
            "success" => JobStatus::Success,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(status),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        match status {
            JobStatus::Other(status) => status,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
