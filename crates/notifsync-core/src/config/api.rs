//! Remote notification feed configuration.

use serde::{Deserialize, Serialize};

/// Backend endpoints for the unread-notification feed.
///
/// Path templates are relative to `base_url`. `{user_id}` and `{id}` are
/// substituted per call; every other segment is used verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the commerce backend.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Unread list for a user.
    #[serde(default = "default_unread_path")]
    pub unread_path: String,
    /// Mark a single notification read.
    #[serde(default = "default_mark_read_path")]
    pub mark_read_path: String,
    /// Mark every notification of a user read.
    #[serde(default = "default_mark_all_read_path")]
    pub mark_all_read_path: String,
    /// Delete a single notification.
    #[serde(default = "default_delete_path")]
    pub delete_path: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_seconds: default_request_timeout(),
            unread_path: default_unread_path(),
            mark_read_path: default_mark_read_path(),
            mark_all_read_path: default_mark_all_read_path(),
            delete_path: default_delete_path(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api/".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_unread_path() -> String {
    "notifications/user/{user_id}/unread".to_string()
}

fn default_mark_read_path() -> String {
    "notifications/{id}/read".to_string()
}

fn default_mark_all_read_path() -> String {
    "notifications/user/{user_id}/read-all".to_string()
}

fn default_delete_path() -> String {
    "notifications/{id}".to_string()
}
