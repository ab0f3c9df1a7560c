//! Client-side notification synchronization.
//!
//! This crate provides:
//! - [`NotificationStore`], the single in-memory owner of notification state
//! - [`SyncEngine`], which reconciles the store with the remote unread feed,
//!   materializes unseen notifications exactly once, and handles read/delete
//!   actions optimistically
//! - [`resolve_navigation`], the pure payload-to-destination mapping
//! - [`relative_time`] for "N minutes ago" rendering

pub mod engine;
pub mod format;
pub mod navigation;
pub mod store;

pub use engine::{
    Acknowledgement, CycleOutcome, CycleReport, SyncCursor, SyncDeps, SyncEngine, SyncFailure,
    SyncPhase, SyncStage, SyncStatus,
};
pub use format::relative_time;
pub use navigation::resolve_navigation;
pub use store::{NotificationSnapshot, NotificationStore};
