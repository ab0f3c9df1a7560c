//! Resolved in-app navigation target.

use serde::{Deserialize, Serialize};

/// A route plus ordered query parameters, handed to the navigation router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// In-app route, e.g. `/cart`.
    pub route: String,
    /// Query parameters in insertion order.
    pub params: Vec<(String, String)>,
}

impl Destination {
    /// A destination without parameters.
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            params: Vec::new(),
        }
    }

    /// Append a query parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Look up a parameter by key.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Form-encoded query string, without the leading `?`.
    pub fn query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .finish()
    }

    /// Route with its query string appended, if any.
    pub fn href(&self) -> String {
        if self.params.is_empty() {
            self.route.clone()
        } else {
            format!("{}?{}", self.route, self.query_string())
        }
    }
}
