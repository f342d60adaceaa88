//! Per-message transform stages between the source and the window engine
//!
//! Each stage runs until its input closes or its output is dropped, and
//! closes its own output on return.

use super::reading::NoiseReading;
use tokio::sync::mpsc;

/// Scale a raw reading down by `divisor`
pub fn scale_noise(reading: &NoiseReading, divisor: f32) -> f32 {
    reading.noise / divisor
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakReport {
    pub value: f32,
    pub threshold_reached: bool,
    /// `value - threshold`, negative when below
    pub delta: f32,
}

/// Compare a single value against the peak threshold (inclusive)
pub fn check_peak(value: f32, threshold: f32) -> PeakReport {
    PeakReport {
        value,
        threshold_reached: value >= threshold,
        delta: value - threshold,
    }
}

/// Scale stage: log each reading with its latency and forward the scaled value
pub async fn run_scale_stage(
    mut rx: mpsc::Receiver<NoiseReading>,
    tx: mpsc::Sender<f32>,
    divisor: f32,
) -> u64 {
    let mut processed = 0u64;

    while let Some(reading) = rx.recv().await {
        let value = scale_noise(&reading, divisor);
        log::info!(
            "✅ [{}] {} > value: {:.3} ⚡️={}ms",
            reading.from,
            reading.time,
            value,
            reading.latency_ms()
        );

        if tx.send(value).await.is_err() {
            log::warn!("⚠️  Scale stage output closed, stopping");
            break;
        }
        processed += 1;
    }

    log::info!("✅ Scale stage stopped ({} readings)", processed);
    processed
}

/// Peak stage: report single values at or above `threshold`, forward unchanged
pub async fn run_peak_stage(mut rx: mpsc::Receiver<f32>, tx: mpsc::Sender<f32>, threshold: f32) -> u64 {
    let mut processed = 0u64;

    while let Some(value) = rx.recv().await {
        let report = check_peak(value, threshold);
        log::debug!("✅ receive noise value: {:.3}", value);
        if report.threshold_reached {
            log::warn!(
                "❗ value: {:.3} reaches the threshold {}! 𝚫={:.3}",
                report.value,
                threshold,
                report.delta
            );
        }

        if tx.send(value).await.is_err() {
            log::warn!("⚠️  Peak stage output closed, stopping");
            break;
        }
        processed += 1;
    }

    log::info!("✅ Peak stage stopped ({} values)", processed);
    processed
}

/// Terminal consumer of the engine's outbound feed
pub async fn run_log_sink(mut rx: mpsc::Receiver<f32>) -> u64 {
    let mut received = 0u64;

    while let Some(value) = rx.recv().await {
        received += 1;
        log::debug!("📤 forwarded value: {:.3}", value);
    }

    log::info!("✅ Outbound feed closed after {} values", received);
    received
}
