//! Sliding time window storage
//!
//! The store keeps `(timestamp, value)` samples in arrival order and evicts
//! everything older than the window duration when a snapshot is taken.

pub mod store;

pub use store::{Sample, WindowStore};
