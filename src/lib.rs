//! # noiseflow
//!
//! Time-windowed streaming aggregation for scalar noise readings.
//!
//! The core is the [`engine::SlidingWindowEngine`]: it forwards every
//! inbound sample downstream as soon as it arrives, keeps recent samples in
//! a [`window::WindowStore`], and periodically hands a snapshot of the
//! window to an [`aggregator::Aggregator`] such as
//! [`aggregator::ThresholdAverage`].
//!
//! ## Module Organization
//!
//! - `window` - Samples and the time-bounded store
//! - `aggregator` - Callback contract and the threshold average
//! - `engine` - Forwarder and evaluator activities, shutdown coordination
//! - `config` - Environment-driven configuration
//! - `stages` - Source and transform stages for the noise pipeline binary

pub mod aggregator;
pub mod config;
pub mod engine;
pub mod stages;
pub mod window;

pub use aggregator::{Aggregator, AggregatorError, ThresholdAverage};
pub use config::{ConfigError, EngineConfig, PipelineConfig};
pub use engine::{EngineError, EngineHandle, EngineReport, SlidingWindowEngine};
pub use window::{Sample, WindowStore};
