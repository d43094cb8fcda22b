//! Tracker configuration.

use std::time::Duration;

/// Fixed polling interval for job status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(5000);

/// Per-request HTTP timeout. A request exceeding it is a transport
/// failure like any other.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Tunable parameters for a [`crate::controller::GenerationTracker`].
#[derive(Debug, Clone)]
pub struct TrackerConfig {
    /// Delay between consecutive status polls for one job.
    pub poll_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}
