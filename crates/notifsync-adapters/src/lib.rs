//! Adapters for the collaborators of the synchronization engine.
//!
//! This crate provides:
//! - An HTTP client for the backend's unread-notification feed
//! - An in-process device notification scheduler with a tap stream
//! - A session-backed identity resolver

pub mod feed;
pub mod identity;
pub mod scheduler;

pub use feed::HttpNotificationFeed;
pub use identity::SessionIdentity;
pub use scheduler::ChannelScheduler;
