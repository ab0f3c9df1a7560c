//! Lifecycle-driven polling for the notification sync engine.
//!
//! This crate provides:
//! - A lifecycle controller that runs sync cycles on mount, on a fixed
//!   interval while the app is in the foreground, and on focus changes
//! - A handle for feeding app state events to the controller and
//!   unmounting it
//! - Dispatch of device notification taps to the engine

pub mod runner;

pub use runner::{AppState, LifecycleController, LifecycleEvent, LifecycleHandle};
