//! Local notification scheduler adapters.

pub mod channel;

pub use channel::ChannelScheduler;
