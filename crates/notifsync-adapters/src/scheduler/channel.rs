//! In-process device notification scheduler.
//!
//! Stands in for the OS notification facility: "showing" a notification logs
//! it and records it, and taps are injected with [`ChannelScheduler::respond`]
//! and fanned out to subscribers over a broadcast channel.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::{debug, info};

use notifsync_core::config::SchedulerConfig;
use notifsync_core::error::AppError;
use notifsync_core::result::AppResult;
use notifsync_core::traits::{LocalScheduler, PermissionStatus};
use notifsync_core::types::{LocalContent, NotificationResponse};

/// Scheduler backed by a broadcast channel of user responses.
#[derive(Debug)]
pub struct ChannelScheduler {
    /// Current platform permission.
    permission: Mutex<PermissionStatus>,
    /// Grant when permission is first requested.
    auto_grant: bool,
    /// Notifications shown so far, oldest first.
    delivered: Mutex<Vec<LocalContent>>,
    /// Tap fan-out.
    responses: broadcast::Sender<NotificationResponse>,
}

impl ChannelScheduler {
    /// Create a scheduler whose permission is still undetermined.
    pub fn new(config: &SchedulerConfig) -> Self {
        let (responses, _) = broadcast::channel(config.response_buffer.max(1));
        Self {
            permission: Mutex::new(PermissionStatus::Undetermined),
            auto_grant: config.auto_grant_permission,
            delivered: Mutex::new(Vec::new()),
            responses,
        }
    }

    /// Start from a fixed permission state.
    pub fn with_permission(self, status: PermissionStatus) -> Self {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner()) = status;
        self
    }

    /// Notifications shown so far, oldest first.
    pub fn delivered(&self) -> Vec<LocalContent> {
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Simulate the user tapping the delivered notification `local_id`.
    ///
    /// Returns the number of subscribers that received the response.
    pub fn respond(&self, local_id: &str) -> AppResult<usize> {
        let content = self
            .delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .rev()
            .find(|c| c.local_id == local_id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("No delivered notification '{local_id}'")))?;

        let response = NotificationResponse {
            notification_id: Some(content.local_id),
            data: content.data,
        };
        // No subscribers is not an error; the tap is simply unobserved.
        Ok(self.responses.send(response).unwrap_or(0))
    }
}

#[async_trait]
impl LocalScheduler for ChannelScheduler {
    async fn permission_status(&self) -> PermissionStatus {
        *self.permission.lock().unwrap_or_else(|e| e.into_inner())
    }

    async fn request_permission(&self) -> PermissionStatus {
        let mut permission = self.permission.lock().unwrap_or_else(|e| e.into_inner());
        if *permission == PermissionStatus::Undetermined {
            *permission = if self.auto_grant {
                PermissionStatus::Granted
            } else {
                PermissionStatus::Denied
            };
            debug!(status = ?*permission, "Notification permission decided");
        }
        *permission
    }

    async fn schedule(&self, content: LocalContent) -> AppResult<String> {
        if !self.permission_status().await.is_granted() {
            return Err(AppError::scheduler("Notification permission not granted"));
        }

        info!(
            local_id = %content.local_id,
            kind = %content.kind,
            title = %content.title,
            "Displaying device notification"
        );
        let handle = content.local_id.clone();
        self.delivered
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(content);
        Ok(handle)
    }

    fn subscribe(&self) -> broadcast::Receiver<NotificationResponse> {
        self.responses.subscribe()
    }
}
