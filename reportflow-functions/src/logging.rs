//! Logging setup
//!
//! Text output for local runs, JSON lines for the hosting platform's log
//! ingestion. Request identity is carried by spans built from the
//! [`ExecutionContext`], never by global state.

use clap::ValueEnum;
use reportflow_core::domain::context::ExecutionContext;
use tracing::{Span, info_span};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Output format of the log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

pub fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "reportflow_functions=info,reportflow_client=info,tower_http=debug".into());

    match format {
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init(),
    }
}

/// Span carrying the identity of one pipeline execution
pub fn execution_span(ctx: &ExecutionContext) -> Span {
    info_span!(
        "execution",
        execution_id = %ctx.execution_id,
        client_name = %ctx.client_name,
        pipeline_phase = %ctx.pipeline_phase,
    )
}
