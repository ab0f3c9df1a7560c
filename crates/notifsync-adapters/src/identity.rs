//! Session-backed identity resolver.

use std::sync::RwLock;

use async_trait::async_trait;
use tracing::info;

use notifsync_core::config::SessionConfig;
use notifsync_core::traits::IdentityResolver;
use notifsync_core::types::UserId;

/// Holds the signed-in user for the lifetime of the process.
#[derive(Debug, Default)]
pub struct SessionIdentity {
    user: RwLock<Option<UserId>>,
}

impl SessionIdentity {
    /// Start from the configured session.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            user: RwLock::new(
                config
                    .user_id
                    .as_deref()
                    .filter(|id| !id.trim().is_empty())
                    .map(UserId::from),
            ),
        }
    }

    /// Record a successful login.
    pub fn sign_in(&self, user: UserId) {
        info!(user = %user, "Signed in");
        *self.user.write().unwrap_or_else(|e| e.into_inner()) = Some(user);
    }

    /// Forget the current user.
    pub fn sign_out(&self) {
        if let Some(user) = self.user.write().unwrap_or_else(|e| e.into_inner()).take() {
            info!(user = %user, "Signed out");
        }
    }
}

#[async_trait]
impl IdentityResolver for SessionIdentity {
    async fn current_user(&self) -> Option<UserId> {
        self.user.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}
