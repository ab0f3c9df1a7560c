//! User-triggered actions outside the polling cycle.
//!
//! Read and delete actions are optimistic: the store changes first and is
//! never rolled back. When the backend call fails, a background refresh is
//! started so the next committed snapshot reflects the backend again
//! (eventual reconciliation, not a retry of the same mutation).

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use notifsync_core::error::AppError;
use notifsync_core::types::{Destination, NotificationResponse};

use super::{Acknowledgement, CycleOutcome, SyncEngine, SyncFailure, SyncStage};
use crate::navigation::resolve_navigation;

impl SyncEngine {
    /// Mark one notification read, then tell the backend unless the id is
    /// local-only.
    pub async fn mark_one_read(self: &Arc<Self>, id: &str) -> Acknowledgement {
        let Some(local_only) = self.store.read_with(|s| s.get(id).map(|r| r.is_local_only())) else {
            return Acknowledgement::NotFound;
        };
        if !self.store.mark_read(id) {
            return Acknowledgement::Unchanged;
        }
        if local_only {
            debug!(id, "Marked local notification read");
            return Acknowledgement::LocalOnly;
        }

        match self.feed.acknowledge_one(id).await {
            Ok(()) => Acknowledgement::Confirmed,
            Err(e) => self.optimistic_failure(SyncStage::MarkRead, Some(id), &e),
        }
    }

    /// Mark everything read locally, then issue one backend call.
    ///
    /// The backend is told even when nothing was unread locally: a record
    /// read optimistically after a failed call may still be unread upstream.
    pub async fn mark_all_read(self: &Arc<Self>) -> Acknowledgement {
        let changed = self.store.mark_all_read();
        let Some(user) = self.identity.current_user().await else {
            return if changed == 0 {
                Acknowledgement::Unchanged
            } else {
                Acknowledgement::LocalOnly
            };
        };

        info!(user = %user, changed, "Marking all notifications read");
        match self.feed.acknowledge_all(&user).await {
            Ok(()) => Acknowledgement::Confirmed,
            Err(e) => self.optimistic_failure(SyncStage::MarkAllRead, None, &e),
        }
    }

    /// Remove a notification locally, then delete it upstream unless the id
    /// is local-only.
    pub async fn delete(self: &Arc<Self>, id: &str) -> Acknowledgement {
        let Some(removed) = self.store.remove(id) else {
            return Acknowledgement::NotFound;
        };
        if removed.is_local_only() {
            debug!(id, "Removed local notification");
            return Acknowledgement::LocalOnly;
        }

        match self.feed.delete_one(id).await {
            Ok(()) => Acknowledgement::Confirmed,
            Err(e) => self.optimistic_failure(SyncStage::Delete, Some(id), &e),
        }
    }

    /// Open a notification from the in-app list: mark it read and navigate
    /// to its destination.
    pub async fn open(self: &Arc<Self>, id: &str) -> Option<Destination> {
        let data = self.store.read_with(|s| s.get(id).map(|r| r.data.clone()))?;
        self.mark_one_read(id).await;
        let destination = resolve_navigation(&data);
        self.router.navigate(&destination);
        Some(destination)
    }

    /// Handle a tap on a device notification.
    pub async fn handle_response(self: &Arc<Self>, response: NotificationResponse) -> Destination {
        if let Some(id) = response.notification_id.as_deref() {
            let ack = self.mark_one_read(id).await;
            debug!(id, ?ack, "Handled notification tap");
        }
        let destination = resolve_navigation(&response.data);
        self.router.navigate(&destination);
        destination
    }

    /// Start a refresh in the background.
    pub fn spawn_reconcile(self: &Arc<Self>) -> JoinHandle<CycleOutcome> {
        let engine = Arc::clone(self);
        tokio::spawn(async move { engine.run_cycle().await })
    }

    fn optimistic_failure(
        self: &Arc<Self>,
        stage: SyncStage,
        id: Option<&str>,
        error: &AppError,
    ) -> Acknowledgement {
        warn!(
            ?stage,
            id = id.unwrap_or("*"),
            error = %error,
            "Backend rejected optimistic update; keeping local state"
        );
        let reconcile = self
            .config
            .reconcile_on_failure
            .then(|| self.spawn_reconcile());
        Acknowledgement::Failed {
            failure: SyncFailure::new(stage, id, error),
            reconcile,
        }
    }
}
