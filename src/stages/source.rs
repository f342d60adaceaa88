//! Source stage: emit random noise readings on a fixed period

use super::reading::NoiseReading;
use crate::engine::{send_unless_cancelled, Delivery};
use rand::Rng;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Emit one reading immediately and then every `period` until cancelled or
/// the downstream closes. Returns the number of readings delivered.
///
/// Dropping `tx` on return closes the chain behind it, which lets every
/// later stage (and the window engine) shut down gracefully.
pub async fn run_source<R: Rng + Send>(
    name: String,
    period: Duration,
    mut rng: R,
    tx: mpsc::Sender<NoiseReading>,
    cancel: CancellationToken,
) -> u64 {
    log::info!("🚀 Starting source '{}' (interval: {}ms)", name, period.as_millis());

    // A stalled send pushes later readings back instead of bursting them
    let mut timer = interval(period);
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut emitted = 0u64;

    loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break,

            _ = timer.tick() => {
                let reading = NoiseReading::random(&name, &mut rng);
                let line = serde_json::to_string(&reading).unwrap_or_else(|_| format!("{:?}", reading));

                match send_unless_cancelled(&cancel, &tx, reading).await {
                    Delivery::Delivered => {
                        emitted += 1;
                        log::info!("✅ Emit {}", line);
                    }
                    Delivery::Cancelled => break,
                    Delivery::Closed => {
                        log::warn!("❌ Emit {} failed: downstream closed", line);
                        break;
                    }
                }
            }
        }
    }

    log::info!("✅ Source '{}' stopped after {} readings", name, emitted);
    emitted
}
