//! Shared application state

use anyhow::Context;
use reportflow_client::{FunctionClient, SlackClient};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;

/// State handed to every handler
///
/// Immutable apart from the shutdown token; nothing about a single request
/// is stored here.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    /// Shared HTTP client with the configured timeout
    pub http: reqwest::Client,
    /// Client for stage functions; bounds connecting only, a stage answers
    /// when its job has finished
    pub stage_http: reqwest::Client,
    /// Fired on shutdown so in-flight watches stop and kill their jobs
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: Config, shutdown: CancellationToken) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .context("Failed to build HTTP client")?;
        let stage_http = reqwest::Client::builder()
            .connect_timeout(config.http_timeout)
            .build()
            .context("Failed to build stage HTTP client")?;

        Ok(Self {
            config: Arc::new(config),
            http,
            stage_http,
            shutdown,
        })
    }

    /// Client for the alerting function
    pub fn functions(&self) -> FunctionClient {
        FunctionClient::new(self.http.clone())
    }

    /// Client for the stage functions the orchestrator waits on
    pub fn stages(&self) -> FunctionClient {
        FunctionClient::new(self.stage_http.clone())
    }

    pub fn slack(&self) -> SlackClient {
        SlackClient::with_client(&self.config.slack_api_url, self.http.clone())
    }
}
