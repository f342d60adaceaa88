//! Window store shared by the forwarder and evaluator activities

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

/// A single observation stamped with its arrival time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub timestamp: Instant,
    pub value: f32,
}

impl Sample {
    pub fn new(timestamp: Instant, value: f32) -> Self {
        Self { timestamp, value }
    }

    /// Stamp a raw value with the current time
    pub fn now(value: f32) -> Self {
        Self::new(Instant::now(), value)
    }
}

/// Ordered buffer of in-window samples
///
/// Append and evict-and-snapshot run under one lock, so concurrent callers
/// never observe a half-evicted buffer. Samples are expected in
/// non-decreasing timestamp order, which holds when they are stamped on
/// arrival.
#[derive(Debug)]
pub struct WindowStore {
    samples: Mutex<VecDeque<Sample>>,
    window_duration: Duration,
}

impl WindowStore {
    pub fn new(window_duration: Duration) -> Self {
        Self {
            samples: Mutex::new(VecDeque::with_capacity(1024)),
            window_duration,
        }
    }

    pub fn window_duration(&self) -> Duration {
        self.window_duration
    }

    /// Add a sample at the end of the window
    pub fn append(&self, sample: Sample) {
        self.lock().push_back(sample);
    }

    /// Drop samples older than `now - window_duration` and return the values
    /// that remain, oldest first.
    ///
    /// The cutoff is inclusive: a sample stamped exactly at the cutoff stays.
    pub fn evict_and_snapshot(&self, now: Instant) -> Vec<f32> {
        let mut samples = self.lock();

        // Before a full window has elapsed since the clock's origin nothing
        // can be old enough to evict.
        if let Some(cutoff) = now.checked_sub(self.window_duration) {
            while let Some(front) = samples.front() {
                if front.timestamp < cutoff {
                    samples.pop_front();
                } else {
                    break;
                }
            }
        }

        samples.iter().map(|s| s.value).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The buffer stays consistent even if a holder panicked mid-call:
    // push_back and pop_front leave it valid at every step.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Sample>> {
        self.samples.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
