//! Core domain types
//!
//! These types describe what the functions reason about: external jobs and
//! their status, the outcome of watching a job, the alert sent when a stage
//! fails, and the context that identifies one pipeline execution.

pub mod alert;
pub mod context;
pub mod job;
pub mod outcome;
