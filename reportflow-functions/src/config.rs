//! Server configuration
//!
//! Where the sibling functions live and how alerts are delivered. Everything
//! per-run (queue endpoint, tokens, deadlines) arrives in the request body
//! instead.

use reportflow_client::DEFAULT_SLACK_API_URL;
use reportflow_core::dto::function::DEFAULT_LOGS_PROJECT;
use reportflow_core::dto::slack::DEFAULT_ALERT_CHANNEL;
use std::time::Duration;

/// Default URL of the Keboola trigger function
pub const DEFAULT_KEBOOLA_TRIGGER_URL: &str = "https://europe-west1-niftyminds-client-reporting.cloudfunctions.net/gen2_http_client_reporting_keboola_orchestrationV2_trigger";

/// Default URL of the Dataform trigger function
pub const DEFAULT_DATAFORM_TRIGGER_URL: &str = "https://europe-west1-niftyminds-client-reporting.cloudfunctions.net/gen2_http_client_reporting_dataform_trigger";

/// A stage function the orchestrator calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageEndpoint {
    /// Key of the stage's sub-object in the orchestrator request
    pub key: String,
    /// Display name used in logs and alerts
    pub name: String,
    pub url: String,
}

impl StageEndpoint {
    pub fn new(key: impl Into<String>, name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Address the HTTP server binds to
    pub bind_addr: String,

    /// Stages the orchestrator runs, in order
    pub stages: Vec<StageEndpoint>,

    /// Alerting function used by the orchestrator; alerts go straight to
    /// Slack when unset
    pub slack_alerting_url: Option<String>,

    /// Base URL of the Slack Web API
    pub slack_api_url: String,

    /// Channel alerts are posted to
    pub slack_channel: String,

    /// Project linked from alert log URLs unless the request names one
    pub logs_project: String,

    /// Timeout of every outbound HTTP request
    pub http_timeout: Duration,
}

impl Config {
    /// The two-stage client reporting pipeline at the given URLs
    pub fn new(keboola_trigger_url: impl Into<String>, dataform_trigger_url: impl Into<String>) -> Self {
        Self {
            bind_addr: "0.0.0.0:8080".to_string(),
            stages: vec![
                StageEndpoint::new(
                    "keboola_trigger",
                    "Keboola orchestration trigger",
                    keboola_trigger_url,
                ),
                StageEndpoint::new("dataform_trigger", "Dataform trigger", dataform_trigger_url),
            ],
            slack_alerting_url: None,
            slack_api_url: DEFAULT_SLACK_API_URL.to_string(),
            slack_channel: DEFAULT_ALERT_CHANNEL.to_string(),
            logs_project: DEFAULT_LOGS_PROJECT.to_string(),
            http_timeout: Duration::from_secs(30),
        }
    }

    /// Keys of the stage sub-objects, in pipeline order
    pub fn stage_keys(&self) -> Vec<&str> {
        self.stages.iter().map(|stage| stage.key.as_str()).collect()
    }

    /// Validates the configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.bind_addr.is_empty() {
            anyhow::bail!("bind_addr cannot be empty");
        }

        if self.stages.is_empty() {
            anyhow::bail!("at least one stage must be configured");
        }

        for stage in &self.stages {
            validate_url(&format!("{} url", stage.key), &stage.url)?;
        }

        if let Some(url) = &self.slack_alerting_url {
            validate_url("slack_alerting_url", url)?;
        }

        validate_url("slack_api_url", &self.slack_api_url)?;

        if self.slack_channel.is_empty() {
            anyhow::bail!("slack_channel cannot be empty");
        }

        if self.http_timeout.as_secs() == 0 {
            anyhow::bail!("http_timeout must be greater than 0");
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(DEFAULT_KEBOOLA_TRIGGER_URL, DEFAULT_DATAFORM_TRIGGER_URL)
    }
}

fn validate_url(name: &str, url: &str) -> anyhow::Result<()> {
    if url.is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        anyhow::bail!("{} must start with http:// or https://", name);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.stage_keys(), ["keboola_trigger", "dataform_trigger"]);
        assert_eq!(config.slack_channel, "#client-reporting-alerts");
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert!(config.slack_alerting_url.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.stages[1].url = "not-a-url".to_string();
        assert!(config.validate().is_err());

        config.stages[1].url = "http://localhost:8081".to_string();
        assert!(config.validate().is_ok());

        config.slack_alerting_url = Some("ftp://alerts".to_string());
        assert!(config.validate().is_err());

        config.slack_alerting_url = Some("http://localhost:8082/slack-alerting".to_string());
        assert!(config.validate().is_ok());

        config.http_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_no_stages_is_invalid() {
        let mut config = Config::default();
        config.stages.clear();
        assert!(config.validate().is_err());
    }
}
