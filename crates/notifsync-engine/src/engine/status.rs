//! Engine state, cursor, and outcome types.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::task::JoinHandle;

use notifsync_core::error::{AppError, ErrorKind};

/// Where a polling cycle currently is.
///
/// `Error` is a resting state like `Idle`, reached when the last cycle could
/// not fetch; the next cycle leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncPhase {
    /// No cycle running.
    #[default]
    Idle,
    /// Requesting the unread list.
    Fetching,
    /// Applying the fetched list to the store.
    Merging,
    /// Scheduling device notifications for novel records.
    Materializing,
    /// Acknowledging materialized records upstream.
    Acknowledging,
    /// No cycle running; the last one failed to fetch.
    Error,
}

impl SyncPhase {
    /// Whether a cycle is in flight.
    pub fn is_running(self) -> bool {
        !matches!(self, Self::Idle | Self::Error)
    }
}

/// The operation a [`SyncFailure`] happened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncStage {
    /// Fetching the unread list.
    Fetch,
    /// Acknowledging a materialized record.
    Acknowledge,
    /// User marked one notification read.
    MarkRead,
    /// User marked everything read.
    MarkAllRead,
    /// User deleted a notification.
    Delete,
}

/// A failed backend call, as exposed to the UI.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyncFailure {
    /// Operation that failed.
    pub stage: SyncStage,
    /// Notification involved, if any.
    pub record_id: Option<String>,
    /// Error category.
    pub kind: ErrorKind,
    /// Error message.
    pub message: String,
    /// When the failure was observed.
    pub at: DateTime<Utc>,
}

impl SyncFailure {
    /// Capture `error` for `stage`.
    pub fn new(stage: SyncStage, record_id: Option<&str>, error: &AppError) -> Self {
        Self {
            stage,
            record_id: record_id.map(str::to_string),
            kind: error.kind,
            message: error.message.clone(),
            at: Utc::now(),
        }
    }
}

/// Progress marker for polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SyncCursor {
    /// Time of the last successful fetch.
    pub last_success_at: Option<DateTime<Utc>>,
    /// Whether recurring polling is active.
    pub polling: bool,
}

/// Everything the UI needs to render sync state and a retry control.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct SyncStatus {
    /// Current phase.
    pub phase: SyncPhase,
    /// First failure of the last completed cycle, or the fetch failure that
    /// aborted it.
    pub last_error: Option<SyncFailure>,
    /// Polling cursor.
    pub cursor: SyncCursor,
}

/// Summary of a completed cycle.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CycleReport {
    /// Records returned by the feed.
    pub fetched: usize,
    /// Remote ids materialized as local echoes this cycle.
    pub materialized: Vec<String>,
    /// Remote ids acknowledged upstream this cycle.
    pub acknowledged: Vec<String>,
    /// Device notifications that could not be shown.
    pub schedule_failures: usize,
    /// Isolated per-record failures, in order.
    pub failures: Vec<SyncFailure>,
}

/// Result of [`SyncEngine::run_cycle`](super::SyncEngine::run_cycle).
#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    /// Another cycle was already running.
    Skipped,
    /// Nobody is signed in.
    Unauthenticated,
    /// The fetch failed; the store was not touched.
    Failed(SyncFailure),
    /// The engine was reset while the cycle was in flight; nothing after
    /// the reset was written.
    Superseded,
    /// The cycle ran to completion.
    Completed(CycleReport),
}

impl CycleOutcome {
    /// The report, if the cycle completed.
    pub fn report(&self) -> Option<&CycleReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }
}

/// Result of an optimistic user action against the backend.
#[derive(Debug)]
pub enum Acknowledgement {
    /// No such notification in the store.
    NotFound,
    /// Nothing changed locally, so nothing was sent.
    Unchanged,
    /// Local-only state; the backend is never told.
    LocalOnly,
    /// The backend confirmed the change.
    Confirmed,
    /// The backend call failed; the local change stands. `reconcile` is the
    /// background refresh started to correct divergence, if enabled.
    Failed {
        /// What went wrong.
        failure: SyncFailure,
        /// Reconciliation cycle, if one was started.
        reconcile: Option<JoinHandle<CycleOutcome>>,
    },
}

impl Acknowledgement {
    /// Whether a backend call was attempted.
    pub fn reached_backend(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Failed { .. })
    }
}
