//! Convenience result type alias for notifsync.

use crate::error::AppError;

/// A specialized `Result` type for notifsync operations.
pub type AppResult<T> = Result<T, AppError>;
