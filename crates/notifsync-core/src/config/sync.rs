//! Synchronization engine configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Polling and reconciliation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Interval in seconds between polling cycles while in the foreground.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Run a background refresh after an optimistic mutation fails upstream.
    #[serde(default = "default_true")]
    pub reconcile_on_failure: bool,
}

impl SyncConfig {
    /// Polling interval as a [`Duration`]; never zero.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval_seconds: default_poll_interval(),
            reconcile_on_failure: true,
        }
    }
}

fn default_poll_interval() -> u64 {
    5
}

fn default_true() -> bool {
    true
}
