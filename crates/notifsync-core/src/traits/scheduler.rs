//! Local (device) notification scheduler trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::result::AppResult;
use crate::types::{LocalContent, NotificationResponse};

/// Platform permission to show device notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionStatus {
    /// Notifications may be shown.
    Granted,
    /// The user refused; scheduling is skipped.
    Denied,
    /// Never asked.
    Undetermined,
}

impl PermissionStatus {
    /// Whether scheduling is allowed.
    pub fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Wraps the OS notification facility.
#[async_trait]
pub trait LocalScheduler: Send + Sync + std::fmt::Debug + 'static {
    /// Current permission without prompting.
    async fn permission_status(&self) -> PermissionStatus;

    /// Prompt for permission if it has not been decided yet.
    async fn request_permission(&self) -> PermissionStatus;

    /// Show a device notification; returns the platform's handle for it.
    async fn schedule(&self, content: LocalContent) -> AppResult<String>;

    /// Stream of user taps on delivered notifications.
    fn subscribe(&self) -> broadcast::Receiver<NotificationResponse>;
}
