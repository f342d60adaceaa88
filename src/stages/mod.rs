//! Noise pipeline stages feeding the window engine
//!
//! ```text
//! run_source → run_scale_stage → run_peak_stage → SlidingWindowEngine → run_log_sink
//! ```
//!
//! Stages talk over in-process mpsc channels. Closing the source's sender
//! cascades down the chain and ends with the engine's final flush.

pub mod reading;
pub mod source;
pub mod transforms;

pub use reading::NoiseReading;
pub use source::run_source;
pub use transforms::{check_peak, run_log_sink, run_peak_stage, run_scale_stage, scale_noise, PeakReport};
