//! Collaborator traits defined in `notifsync-core` and implemented by the
//! adapter crate (and by test doubles).

pub mod feed;
pub mod identity;
pub mod router;
pub mod scheduler;

pub use feed::NotificationFeed;
pub use identity::IdentityResolver;
pub use router::NavigationRouter;
pub use scheduler::{LocalScheduler, PermissionStatus};
