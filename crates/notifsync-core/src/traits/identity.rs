//! Authenticated user resolution.

use async_trait::async_trait;

use crate::types::UserId;

/// Resolves the currently signed-in user.
#[async_trait]
pub trait IdentityResolver: Send + Sync + std::fmt::Debug + 'static {
    /// The current user, or `None` when logged out.
    async fn current_user(&self) -> Option<UserId>;
}
