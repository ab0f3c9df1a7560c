//! Remote notification feed trait.

use async_trait::async_trait;

use crate::result::AppResult;
use crate::types::{NotificationRecord, UserId};

/// Request/response access to the backend's unread-notification feed.
///
/// Implementations are stateless. Any transport failure or non-2xx status is
/// reported as an `Err`; callers treat every error as "this call failed".
#[async_trait]
pub trait NotificationFeed: Send + Sync + std::fmt::Debug + 'static {
    /// Fetch the unread notifications of `user`.
    async fn fetch_unread(&self, user: &UserId) -> AppResult<Vec<NotificationRecord>>;

    /// Mark one remote notification read upstream.
    async fn acknowledge_one(&self, remote_id: &str) -> AppResult<()>;

    /// Mark every notification of `user` read upstream.
    async fn acknowledge_all(&self, user: &UserId) -> AppResult<()>;

    /// Delete one remote notification upstream.
    async fn delete_one(&self, remote_id: &str) -> AppResult<()>;
}
