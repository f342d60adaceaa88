//! Noise Pipeline Runtime
//!
//! Wires the whole chain in one process:
//! - Source emits random noise readings
//! - Scale stage divides each reading
//! - Peak stage reports single values over the peak threshold
//! - Sliding window engine averages the recent window and forwards every value
//! - Log sink drains the engine's outbound feed
//!
//! Usage:
//!   cargo run --release --bin noise_pipeline
//!
//! Environment variables:
//!   WINDOW_DURATION_MS - Sliding window span (default: 10000)
//!   EVALUATION_INTERVAL_MS - Average recompute interval (default: 1000)
//!   AVERAGE_THRESHOLD - Window average alert threshold (default: 13)
//!   PEAK_THRESHOLD - Single value alert threshold (default: 16)
//!   SOURCE_INTERVAL_MS - Delay between readings (default: 5000)
//!   FEED_CHANNEL_BUFFER - Channel size between stages (default: 1024)
//!
//! The first CTRL+C stops the source; the engine then flushes once and
//! exits. A second CTRL+C cancels the engine without the final flush.

use dotenv::dotenv;
use log::{error, info, warn};
use noiseflow::config::PipelineConfig;
use noiseflow::engine::{feed_channel, SlidingWindowEngine};
use noiseflow::stages::{run_log_sink, run_peak_stage, run_scale_stage, run_source};
use noiseflow::ThresholdAverage;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize environment and logging
    dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = PipelineConfig::from_env()?;

    info!("🚀 Noise Pipeline Runtime");
    info!("   ├─ Source: {} every {}ms", config.source_name, config.source_interval.as_millis());
    info!("   ├─ Scale divisor: {}", config.scale_divisor);
    info!("   ├─ Peak threshold: {}", config.peak_threshold);
    info!("   ├─ Average threshold: {}", config.engine.average_threshold);
    info!("   └─ Channel buffer: {}", config.engine.channel_buffer);

    let (reading_tx, reading_rx) = mpsc::channel(config.engine.channel_buffer);
    let (scaled_tx, scaled_rx) = feed_channel(&config.engine);
    let (peak_tx, peak_rx) = feed_channel(&config.engine);
    let (outbound_tx, outbound_rx) = feed_channel(&config.engine);

    let source_shutdown = CancellationToken::new();
    let engine_cancel = CancellationToken::new();

    let aggregator = ThresholdAverage::new(
        config.engine.average_threshold,
        config.engine.window_duration,
    );
    let engine = SlidingWindowEngine::new(config.engine.clone(), aggregator)?.start(
        peak_rx,
        outbound_tx,
        engine_cancel.clone(),
    );

    tokio::spawn(run_source(
        config.source_name.clone(),
        config.source_interval,
        StdRng::from_entropy(),
        reading_tx,
        source_shutdown.clone(),
    ));
    tokio::spawn(run_scale_stage(reading_rx, scaled_tx, config.scale_divisor));
    tokio::spawn(run_peak_stage(scaled_rx, peak_tx, config.peak_threshold));
    let sink = tokio::spawn(run_log_sink(outbound_rx));

    info!("✅ All stages running");
    info!("🔄 Press CTRL+C to shutdown gracefully");

    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("⚠️  Received CTRL+C, draining pipeline..."),
        Err(err) => error!("❌ Failed to listen for CTRL+C: {}", err),
    }

    // Closing the source cascades through the stages into a graceful engine stop
    source_shutdown.cancel();

    let abort_watch = {
        let engine_cancel = engine_cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("⚠️  Second CTRL+C, cancelling engine without final flush");
                engine_cancel.cancel();
            }
        })
    };

    let report = engine.join().await?;
    abort_watch.abort();

    match sink.await {
        Ok(count) => info!("📤 Sink received {} values", count),
        Err(err) => error!("❌ Sink task failed: {}", err),
    }

    info!("📊 Engine report:");
    info!("   ├─ Shutdown: {:?}", report.forwarder.shutdown);
    info!("   ├─ Forwarded: {}/{}", report.forwarder.forwarded, report.forwarder.received);
    info!("   ├─ Evaluations: {}", report.evaluator.evaluations);
    info!("   ├─ Aggregator failures: {}", report.evaluator.callback_failures);
    info!("   └─ Final flush: {}", report.evaluator.flushed);

    info!("✅ Noise pipeline stopped");
    Ok(())
}
