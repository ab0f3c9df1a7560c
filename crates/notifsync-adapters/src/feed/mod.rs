//! Remote notification feed over HTTP.

pub mod envelope;
pub mod http;

pub use envelope::{DecodedFeed, EnvelopeStrategy, decode_feed};
pub use http::HttpNotificationFeed;
