//! Notification domain model.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use super::id::is_local_id;

/// Category tag used for iconography and navigation routing.
///
/// The set is open: unknown tags are kept verbatim in [`NotificationType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NotificationType {
    /// Order status updates.
    Order,
    /// Marketing and promotions.
    Promotion,
    /// System messages.
    System,
    /// Price negotiation updates.
    Negotiation,
    /// Return / refund updates.
    Return,
    /// Anything without a more specific tag.
    #[default]
    General,
    /// A tag this client does not know yet.
    Other(String),
}

impl NotificationType {
    /// Return the tag as a string.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Order => "order",
            Self::Promotion => "promotion",
            Self::System => "system",
            Self::Negotiation => "negotiation",
            Self::Return => "return",
            Self::General => "general",
            Self::Other(tag) => tag,
        }
    }

    /// Icon name rendered next to notifications of this type.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Order => "cube-outline",
            Self::Promotion => "pricetag-outline",
            Self::System => "settings-outline",
            Self::Negotiation => "chatbubbles-outline",
            Self::Return => "return-down-back-outline",
            Self::General | Self::Other(_) => "notifications-outline",
        }
    }
}

impl From<String> for NotificationType {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "order" => Self::Order,
            "promotion" => Self::Promotion,
            "system" => Self::System,
            "negotiation" => Self::Negotiation,
            "return" => Self::Return,
            "general" | "" => Self::General,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for NotificationType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<NotificationType> for String {
    fn from(kind: NotificationType) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scalar routing payload value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// Boolean flag.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Floating point value.
    Float(f64),
    /// Text value.
    Text(String),
}

impl Scalar {
    fn from_json(value: serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(Self::Bool(b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(Self::Int)
                .or_else(|| n.as_f64().map(Self::Float)),
            serde_json::Value::String(s) => Some(Self::Text(s)),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for Scalar {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Routing payload attached to a notification (`screen`, `action`, domain ids).
///
/// Decoding drops nested objects, arrays and nulls instead of failing.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct NotificationData(BTreeMap<String, Scalar>);

impl NotificationData {
    /// An empty payload.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value, returning `self` for chaining.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.0.get(key)
    }

    /// Value for `key` rendered as text; empty strings count as absent.
    pub fn text(&self, key: &str) -> Option<String> {
        self.0
            .get(key)
            .map(|v| v.to_string())
            .filter(|s| !s.is_empty())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload has no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'de> Deserialize<'de> for NotificationData {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<serde_json::Map<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(Self(
            raw.unwrap_or_default()
                .into_iter()
                .filter_map(|(k, v)| Scalar::from_json(v).map(|s| (k, s)))
                .collect(),
        ))
    }
}

impl FromIterator<(String, Scalar)> for NotificationData {
    fn from_iter<I: IntoIterator<Item = (String, Scalar)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A notification held by the store, either remote or a local echo.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationRecord {
    /// Remote id (backend) or local id (`local_...`).
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Display title.
    #[serde(default)]
    pub title: String,
    /// Display body.
    #[serde(default, alias = "message")]
    pub body: String,
    /// Category tag.
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    /// Routing payload.
    #[serde(default)]
    pub data: NotificationData,
    /// Whether the user has read this notification.
    #[serde(default, alias = "isRead", alias = "is_read")]
    pub read: bool,
    /// Creation time; drives ordering and relative-time rendering.
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    /// Whether this is a device-scheduled echo of a remote record.
    #[serde(default)]
    pub is_local: bool,
    /// For local echoes, the remote id they mirror.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
}

impl NotificationRecord {
    /// Build an unread remote record.
    pub fn remote(
        id: impl Into<String>,
        title: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            kind: NotificationType::General,
            data: NotificationData::new(),
            read: false,
            created_at,
            is_local: false,
            source_id: None,
        }
    }

    /// Set the category tag.
    pub fn with_kind(mut self, kind: NotificationType) -> Self {
        self.kind = kind;
        self
    }

    /// Set the routing payload.
    pub fn with_data(mut self, data: NotificationData) -> Self {
        self.data = data;
        self
    }

    /// Build the unread local echo of `self` under `local_id`.
    pub fn echo(&self, local_id: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id: local_id,
            title: self.title.clone(),
            body: self.body.clone(),
            kind: self.kind.clone(),
            data: self.data.clone(),
            read: false,
            created_at,
            is_local: true,
            source_id: Some(self.id.clone()),
        }
    }

    /// Whether read-state changes for this record stay on the device.
    pub fn is_local_only(&self) -> bool {
        self.is_local || is_local_id(&self.id)
    }
}

/// Content handed to the local scheduler for one device notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalContent {
    /// Local id minted for the echo.
    pub local_id: String,
    /// Display title.
    pub title: String,
    /// Display body.
    pub body: String,
    /// Category tag.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Routing payload, delivered back on tap.
    pub data: NotificationData,
}

impl LocalContent {
    /// Content for the echo record `echo`.
    pub fn for_echo(echo: &NotificationRecord) -> Self {
        Self {
            local_id: echo.id.clone(),
            title: echo.title.clone(),
            body: echo.body.clone(),
            kind: echo.kind.clone(),
            data: echo.data.clone(),
        }
    }
}

/// A user interaction (tap) with a device notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationResponse {
    /// Local id of the tapped notification, when the platform reports it.
    pub notification_id: Option<String>,
    /// Routing payload of the tapped notification.
    pub data: NotificationData,
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) if !s.is_empty() => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a non-empty string or number id, got {other}"
        ))),
    }
}
