//! Local notification scheduler configuration.

use serde::{Deserialize, Serialize};

/// Settings for the in-process device notification scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Capacity of the user-response broadcast channel.
    #[serde(default = "default_response_buffer")]
    pub response_buffer: usize,
    /// Grant permission when it is requested for the first time.
    #[serde(default = "default_true")]
    pub auto_grant_permission: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            response_buffer: default_response_buffer(),
            auto_grant_permission: true,
        }
    }
}

fn default_response_buffer() -> usize {
    64
}

fn default_true() -> bool {
    true
}
