//! Session configuration.

use serde::{Deserialize, Serialize};

/// The signed-in user, if any.
///
/// Token storage and refresh live outside this process; the token is used
/// as given.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Backend user id. `None` means logged out.
    #[serde(default)]
    pub user_id: Option<String>,
    /// Bearer token sent with every feed request.
    #[serde(default)]
    pub access_token: Option<String>,
}
