//! Data Transfer Objects
//!
//! Bodies exchanged with the external job queue, the chat API and the sibling
//! functions of the pipeline, plus the request argument checks shared by all
//! function handlers.

pub mod args;
pub mod function;
pub mod queue;
pub mod slack;
