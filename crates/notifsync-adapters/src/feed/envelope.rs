//! Response envelope unwrapping for the unread feed.
//!
//! The backend has shipped three shapes for the same list over time. Each
//! [`EnvelopeStrategy`] either yields the raw list or reports "not this
//! shape"; they are tried in [`EnvelopeStrategy::ORDERED`] order.

use serde_json::Value;
use tracing::{debug, warn};

use notifsync_core::error::AppError;
use notifsync_core::result::AppResult;
use notifsync_core::types::NotificationRecord;

/// A named way of locating the notification list in a response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeStrategy {
    /// `[ ... ]`
    BareArray,
    /// `{ "data": [ ... ] }`
    DataField,
    /// `{ "notifications": [ ... ] }`
    NotificationsField,
}

impl EnvelopeStrategy {
    /// Strategies in the order they are attempted.
    pub const ORDERED: [Self; 3] = [Self::BareArray, Self::DataField, Self::NotificationsField];

    /// Strategy name for logs.
    pub fn name(self) -> &'static str {
        match self {
            Self::BareArray => "bare_array",
            Self::DataField => "data_field",
            Self::NotificationsField => "notifications_field",
        }
    }

    /// Take the list out of `body` if it has this shape.
    fn unwrap(self, body: &mut Value) -> Option<Vec<Value>> {
        let slot = match self {
            Self::BareArray => Some(body),
            Self::DataField => body.get_mut("data"),
            Self::NotificationsField => body.get_mut("notifications"),
        }?;
        match slot.take() {
            Value::Array(items) => Some(items),
            other => {
                *slot = other;
                None
            }
        }
    }
}

/// Records decoded from one feed response.
#[derive(Debug, Clone)]
pub struct DecodedFeed {
    /// The strategy that matched.
    pub strategy: EnvelopeStrategy,
    /// Records that decoded successfully, in response order.
    pub records: Vec<NotificationRecord>,
    /// Elements dropped because they did not decode.
    pub skipped: usize,
}

/// Unwrap and decode a feed response body.
///
/// Individual malformed elements are skipped. A body matching no strategy is
/// an error, so the caller leaves its current list untouched.
pub fn decode_feed(mut body: Value) -> AppResult<DecodedFeed> {
    for strategy in EnvelopeStrategy::ORDERED {
        let Some(items) = strategy.unwrap(&mut body) else {
            continue;
        };

        let total = items.len();
        let records: Vec<NotificationRecord> = items
            .into_iter()
            .enumerate()
            .filter_map(|(index, item)| match serde_json::from_value(item) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!(index, error = %e, "Skipping malformed notification record");
                    None
                }
            })
            .collect();
        let skipped = total - records.len();

        debug!(
            strategy = strategy.name(),
            decoded = records.len(),
            skipped,
            "Decoded unread feed"
        );
        return Ok(DecodedFeed {
            strategy,
            records,
            skipped,
        });
    }

    Err(AppError::serialization(format!(
        "Unrecognized feed envelope: {}",
        shape_of(&body)
    )))
}

fn shape_of(body: &Value) -> String {
    match body {
        Value::Object(map) => {
            let keys: Vec<&str> = map.keys().map(String::as_str).take(5).collect();
            format!("object with keys {keys:?}")
        }
        Value::Array(_) => "array".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(id: &str) -> Value {
        json!({ "id": id, "title": "t", "body": "b", "createdAt": "2026-01-01T00:00:00Z" })
    }

    #[test]
    fn test_bare_array() {
        let feed = decode_feed(json!([item("a"), item("b")])).unwrap();
        assert_eq!(feed.strategy, EnvelopeStrategy::BareArray);
        assert_eq!(feed.records.len(), 2);
    }

    #[test]
    fn test_data_envelope() {
        let feed = decode_feed(json!({ "success": true, "data": [item("a")] })).unwrap();
        assert_eq!(feed.strategy, EnvelopeStrategy::DataField);
        assert_eq!(feed.records[0].id, "a");
    }

    #[test]
    fn test_notifications_envelope() {
        let feed = decode_feed(json!({ "notifications": [item("a")], "total": 1 })).unwrap();
        assert_eq!(feed.strategy, EnvelopeStrategy::NotificationsField);
    }

    #[test]
    fn test_data_object_falls_through_to_notifications() {
        let body = json!({ "data": { "page": 1 }, "notifications": [item("x")] });
        let feed = decode_feed(body).unwrap();
        assert_eq!(feed.strategy, EnvelopeStrategy::NotificationsField);
        assert_eq!(feed.records[0].id, "x");
    }

    #[test]
    fn test_malformed_items_are_skipped() {
        let feed = decode_feed(json!([item("a"), { "title": "no id" }, 42])).unwrap();
        assert_eq!(feed.records.len(), 1);
        assert_eq!(feed.skipped, 2);
    }

    #[test]
    fn test_unrecognized_shape_is_an_error() {
        let err = decode_feed(json!({ "items": [] })).unwrap_err();
        assert_eq!(err.kind, notifsync_core::error::ErrorKind::Serialization);
        assert!(err.message.contains("items"));
    }
}
