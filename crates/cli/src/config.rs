use std::time::Duration;

use dreamtrack_tracker::config::{DEFAULT_POLL_INTERVAL, DEFAULT_REQUEST_TIMEOUT};

/// CLI configuration loaded from environment variables.
///
/// All fields have defaults suitable for a locally running service.
#[derive(Debug, Clone)]
pub struct CliConfig {
    /// Base URL of the generation service.
    pub base_url: String,
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl CliConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `DREAMTRACK_BASE_URL`           | `http://localhost:5000` |
    /// | `DREAMTRACK_POLL_INTERVAL_MS`   | `5000`                  |
    /// | `DREAMTRACK_REQUEST_TIMEOUT_MS` | `30000`                 |
    pub fn from_env() -> Self {
        let base_url = std::env::var("DREAMTRACK_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:5000".into());

        let poll_interval = std::env::var("DREAMTRACK_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);

        let request_timeout = std::env::var("DREAMTRACK_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT);

        Self {
            base_url,
            poll_interval,
            request_timeout,
        }
    }
}
