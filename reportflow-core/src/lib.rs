//! Reportflow Core
//!
//! Core types shared by the client-reporting functions.
//!
//! This crate contains:
//! - Domain types: jobs, watch outcomes, alerts and the per-request execution context
//! - DTOs: bodies exchanged with the job queue, the chat API and sibling functions

pub mod domain;
pub mod dto;
