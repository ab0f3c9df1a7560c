//! # notifsync-core
//!
//! Core crate for the notification synchronization engine. Contains the
//! collaborator traits, configuration schemas, notification domain types,
//! and the unified error system.
//!
//! This crate has **no** internal dependencies on other notifsync crates.

pub mod config;
pub mod error;
pub mod result;
pub mod traits;
pub mod types;

pub use error::AppError;
pub use result::AppResult;
