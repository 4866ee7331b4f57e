//! Reportflow Functions
//!
//! HTTP functions of the client reporting pipeline.
//!
//! Architecture:
//! - API: one handler per function, sharing the `{message|error, details}` envelopes
//! - Services: job triggering and watching, stage orchestration, alerting
//! - Configuration: sibling function URLs and alert delivery, from flags or environment
//!
//! On shutdown the server stops accepting requests, cancels every in-flight
//! job watch (which kills the watched job) and waits for the handlers to answer.

mod api;
mod config;
mod logging;
mod service;
mod state;

use anyhow::{Context, Result};
use clap::Parser;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::config::{Config, DEFAULT_DATAFORM_TRIGGER_URL, DEFAULT_KEBOOLA_TRIGGER_URL};
use crate::logging::{LogFormat, init_tracing};
use crate::state::AppState;

#[derive(Parser)]
#[command(name = "reportflow-functions")]
#[command(about = "Client reporting pipeline functions", long_about = None)]
struct Cli {
    /// Address the HTTP server binds to
    #[arg(long, env = "REPORTFLOW_BIND_ADDR", default_value = "0.0.0.0:8080")]
    bind_addr: String,

    /// URL of the Keboola trigger function
    #[arg(
        long,
        env = "REPORTFLOW_KEBOOLA_TRIGGER_URL",
        default_value = DEFAULT_KEBOOLA_TRIGGER_URL
    )]
    keboola_trigger_url: String,

    /// URL of the Dataform trigger function
    #[arg(
        long,
        env = "REPORTFLOW_DATAFORM_TRIGGER_URL",
        default_value = DEFAULT_DATAFORM_TRIGGER_URL
    )]
    dataform_trigger_url: String,

    /// URL of the Slack alerting function; alerts are posted directly when unset
    #[arg(long, env = "REPORTFLOW_SLACK_ALERTING_URL")]
    slack_alerting_url: Option<String>,

    /// Channel alerts are posted to
    #[arg(long, env = "REPORTFLOW_SLACK_CHANNEL")]
    slack_channel: Option<String>,

    /// Base URL of the Slack Web API
    #[arg(long, env = "REPORTFLOW_SLACK_API_URL")]
    slack_api_url: Option<String>,

    /// Timeout of outbound HTTP requests, in seconds
    #[arg(long, env = "REPORTFLOW_HTTP_TIMEOUT_SECS", default_value_t = 30)]
    http_timeout_secs: u64,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,
}

impl Cli {
    fn into_config(self) -> Config {
        let mut config = Config::new(self.keboola_trigger_url, self.dataform_trigger_url);
        config.bind_addr = self.bind_addr;
        config.slack_alerting_url = self.slack_alerting_url;
        if let Some(channel) = self.slack_channel {
            config.slack_channel = channel;
        }
        if let Some(url) = self.slack_api_url {
            config.slack_api_url = url;
        }
        config.http_timeout = Duration::from_secs(self.http_timeout_secs);
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_format);

    info!("Starting Reportflow Functions...");

    let config = cli.into_config();
    config.validate().context("Invalid configuration")?;
    info!(
        "Loaded configuration: stages={:?}, slack_alerting_url={:?}",
        config.stage_keys(),
        config.slack_alerting_url
    );

    let shutdown = CancellationToken::new();
    let addr = config.bind_addr.clone();
    let state = AppState::new(config, shutdown.clone())?;

    // Build router with all function endpoints
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}

/// Resolves on Ctrl-C after cancelling in-flight watches
async fn shutdown_signal(shutdown: CancellationToken) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received, cancelling in-flight watches");
    shutdown.cancel();
}
