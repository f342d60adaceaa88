use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Upper bound (exclusive) of generated noise values
pub const MAX_NOISE: f32 = 200.0;

/// One raw noise measurement as emitted by the source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseReading {
    /// Noise value
    pub noise: f32,
    /// Timestamp (epoch ms)
    pub time: i64,
    /// Source name
    pub from: String,
}

impl NoiseReading {
    /// Random reading in `[0, MAX_NOISE)` stamped with the current wall clock
    pub fn random<R: Rng + ?Sized>(from: &str, rng: &mut R) -> Self {
        Self {
            noise: rng.gen::<f32>() * MAX_NOISE,
            time: Utc::now().timestamp_millis(),
            from: from.to_string(),
        }
    }

    /// Milliseconds between the reading's timestamp and now
    pub fn latency_ms(&self) -> i64 {
        Utc::now().timestamp_millis() - self.time
    }
}
