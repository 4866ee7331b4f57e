//! Service layer
//!
//! Business logic of the functions. Every outbound dependency sits behind a
//! trait so the watch loop and the orchestration sequence can be exercised
//! against in-memory fakes.

mod notifier;
mod orchestrator;
mod queue;
mod trigger;
mod watcher;

#[cfg(test)]
pub(crate) mod testing;

// Re-export traits
pub use notifier::AlertNotifier;
pub use orchestrator::StageInvoker;
pub use queue::JobQueue;

// Re-export implementations
pub use notifier::{NotifyError, RemoteNotifier, SlackNotifier};
pub use orchestrator::{OrchestrationOutcome, Orchestrator, StageError, StageFailure, StageSpec};
pub use trigger::{StageTrigger, StartError, StartJob};
pub use watcher::{DEFAULT_MAX_RUNTIME, JobWatcher, POLL_INTERVAL};
