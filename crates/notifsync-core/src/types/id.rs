//! Identifier types.
//!
//! Remote notification ids are opaque backend strings. Local ids are minted
//! when a device notification is materialized for a remote record and always
//! carry the [`LOCAL_ID_PREFIX`]; they are never sent to the backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix shared by every locally minted notification id.
pub const LOCAL_ID_PREFIX: &str = "local_";

/// Backend identifier of the signed-in user.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl UserId {
    /// Wrap a backend user id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the raw id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for UserId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Whether `id` belongs to the local id space.
pub fn is_local_id(id: &str) -> bool {
    id.starts_with(LOCAL_ID_PREFIX)
}

/// Mint a local id of the form `local_<unix-millis>_<random>`.
pub fn generate_local_id(now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!("{LOCAL_ID_PREFIX}{}_{}", now.timestamp_millis(), &random[..9])
}
