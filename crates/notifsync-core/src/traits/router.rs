//! In-app navigation.

use crate::types::Destination;

/// Receives destinations resolved from notification payloads.
pub trait NavigationRouter: Send + Sync + std::fmt::Debug + 'static {
    /// Navigate to `destination`.
    fn navigate(&self, destination: &Destination);
}
