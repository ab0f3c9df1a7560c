//! Synchronization engine.
//!
//! One [`SyncEngine`] is constructed by the application root and shared by
//! `Arc`. It never owns timers: the lifecycle controller decides when cycles
//! run and flips the polling flag through [`SyncEngine::start_polling`] and
//! [`SyncEngine::stop_polling`].

mod actions;
mod cycle;
mod status;

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::info;

use notifsync_core::config::SyncConfig;
use notifsync_core::traits::{
    IdentityResolver, LocalScheduler, NavigationRouter, NotificationFeed, PermissionStatus,
};

use crate::store::NotificationStore;

pub use status::{
    Acknowledgement, CycleOutcome, CycleReport, SyncCursor, SyncFailure, SyncPhase, SyncStage,
    SyncStatus,
};

/// External collaborators of the engine.
#[derive(Debug, Clone)]
pub struct SyncDeps {
    /// Remote unread feed.
    pub feed: Arc<dyn NotificationFeed>,
    /// Device notification facility.
    pub scheduler: Arc<dyn LocalScheduler>,
    /// Signed-in user lookup.
    pub identity: Arc<dyn IdentityResolver>,
    /// In-app navigation.
    pub router: Arc<dyn NavigationRouter>,
}

/// Reconciles the notification store with the remote unread feed.
#[derive(Debug)]
pub struct SyncEngine {
    /// Remote unread feed.
    feed: Arc<dyn NotificationFeed>,
    /// Device notification facility.
    scheduler: Arc<dyn LocalScheduler>,
    /// Signed-in user lookup.
    identity: Arc<dyn IdentityResolver>,
    /// In-app navigation.
    router: Arc<dyn NavigationRouter>,
    /// Notification state.
    store: Arc<NotificationStore>,
    /// Engine configuration.
    config: SyncConfig,
    /// Published phase, last error, and cursor.
    status: watch::Sender<SyncStatus>,
    /// Re-entrancy guard for [`SyncEngine::run_cycle`].
    cycle_in_progress: AtomicBool,
    /// Bumped by [`SyncEngine::reset`]; cycles started earlier stop writing.
    generation: AtomicU64,
    /// Remote ids already materialized in this process.
    materialized: Mutex<HashSet<String>>,
    /// Decided scheduler permission, once known.
    permission: Mutex<Option<PermissionStatus>>,
}

impl SyncEngine {
    /// Create an engine over `store`.
    pub fn new(deps: SyncDeps, store: Arc<NotificationStore>, config: SyncConfig) -> Self {
        let (status, _) = watch::channel(SyncStatus::default());
        Self {
            feed: deps.feed,
            scheduler: deps.scheduler,
            identity: deps.identity,
            router: deps.router,
            store,
            config,
            status,
            cycle_in_progress: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            materialized: Mutex::new(HashSet::new()),
            permission: Mutex::new(None),
        }
    }

    /// The store this engine writes to.
    pub fn store(&self) -> &Arc<NotificationStore> {
        &self.store
    }

    /// The scheduler whose taps this engine handles.
    pub fn scheduler(&self) -> &Arc<dyn LocalScheduler> {
        &self.scheduler
    }

    /// Engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Latest published status.
    pub fn status(&self) -> SyncStatus {
        self.status.borrow().clone()
    }

    /// Receive every status change from now on.
    pub fn subscribe_status(&self) -> watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Mark recurring polling active.
    pub fn start_polling(&self) {
        let changed = self.status.send_if_modified(|s| {
            let was = s.cursor.polling;
            s.cursor.polling = true;
            !was
        });
        if changed {
            info!("Notification polling started");
        }
    }

    /// Mark recurring polling stopped. An in-flight cycle still completes.
    pub fn stop_polling(&self) {
        let changed = self.status.send_if_modified(|s| {
            let was = s.cursor.polling;
            s.cursor.polling = false;
            was
        });
        if changed {
            info!("Notification polling stopped");
        }
    }

    /// Whether recurring polling is active.
    pub fn is_polling(&self) -> bool {
        self.status.borrow().cursor.polling
    }

    /// Whether `remote_id` has been materialized by this engine.
    pub fn was_materialized(&self, remote_id: &str) -> bool {
        self.materialized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(remote_id)
    }

    /// Drop all notification state, for example when the user signs out.
    ///
    /// Clears the store, the materialized set and the last error and success
    /// time. A cycle already in flight notices the reset and stops before
    /// writing anything else. Polling and the permission cache are kept.
    pub fn reset(&self) {
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.materialized
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clear();
        self.store.replace_all(Vec::new());
        self.status.send_modify(|s| {
            s.last_error = None;
            s.cursor.last_success_at = None;
            if s.phase == SyncPhase::Error {
                s.phase = SyncPhase::Idle;
            }
        });
        info!("Notification state reset");
    }

    fn superseded(&self, generation: u64) -> bool {
        self.generation.load(Ordering::Acquire) != generation
    }

    fn set_phase(&self, phase: SyncPhase) {
        self.status.send_if_modified(|s| {
            let changed = s.phase != phase;
            s.phase = phase;
            changed
        });
    }
}
