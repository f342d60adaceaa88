//! Integration tests for the noise pipeline stages
//!
//! Tests verify that:
//! 1. The source emits on its period, stops on cancellation and does not
//!    burst after a stalled downstream
//! 2. A closed source cascades through every stage into the engine's final flush

#[cfg(test)]
mod pipeline_tests {
    use noiseflow::aggregator::AggregatorError;
    use noiseflow::config::EngineConfig;
    use noiseflow::engine::{ShutdownKind, SlidingWindowEngine};
    use noiseflow::stages::{
        reading::MAX_NOISE, run_log_sink, run_peak_stage, run_scale_stage, run_source, NoiseReading,
    };
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::{sleep, Instant};
    use tokio_util::sync::CancellationToken;

    #[tokio::test(start_paused = true)]
    async fn test_source_emits_on_period_until_cancelled() {
        let (tx, mut rx) = mpsc::channel::<NoiseReading>(16);
        let cancel = CancellationToken::new();

        let source = tokio::spawn(run_source(
            "sensor-1".to_string(),
            Duration::from_secs(5),
            StdRng::seed_from_u64(7),
            tx,
            cancel.clone(),
        ));

        // Emissions at t=0s, 5s, 10s
        sleep(Duration::from_secs(12)).await;
        cancel.cancel();

        assert_eq!(source.await.unwrap(), 3);

        let mut readings = Vec::new();
        while let Some(r) = rx.recv().await {
            readings.push(r);
        }
        assert_eq!(readings.len(), 3);
        assert!(readings.iter().all(|r| r.from == "sensor-1"));
        assert!(readings.iter().all(|r| r.noise >= 0.0 && r.noise < MAX_NOISE));
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_delays_after_stalled_downstream() {
        // Test: capacity 1, nobody reads until t=22s
        let (tx, mut rx) = mpsc::channel::<NoiseReading>(1);
        let cancel = CancellationToken::new();
        let started = Instant::now();

        let source = tokio::spawn(run_source(
            "sensor-1".to_string(),
            Duration::from_secs(5),
            StdRng::seed_from_u64(3),
            tx,
            cancel.clone(),
        ));

        sleep(Duration::from_secs(22)).await;

        // t=0s reading, the t=5s reading blocked on the full feed, and one late tick
        for _ in 0..3 {
            assert!(rx.recv().await.is_some());
            assert_eq!(started.elapsed().as_secs(), 22);
        }

        // Missed ticks are not replayed: the next reading is a full period later
        assert!(rx.recv().await.is_some());
        assert_eq!(started.elapsed().as_secs(), 27);

        cancel.cancel();
        assert_eq!(source.await.unwrap(), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_stops_when_downstream_closes() {
        let (tx, rx) = mpsc::channel::<NoiseReading>(16);
        drop(rx);

        let emitted = run_source(
            "sensor-1".to_string(),
            Duration::from_secs(1),
            StdRng::seed_from_u64(7),
            tx,
            CancellationToken::new(),
        )
        .await;

        assert_eq!(emitted, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_source_shutdown_cascades_to_final_flush() {
        let snapshots: Arc<Mutex<Vec<Vec<f32>>>> = Arc::new(Mutex::new(Vec::new()));
        let recorder = snapshots.clone();
        let aggregator = move |values: &[f32]| -> Result<(), AggregatorError> {
            recorder.lock().unwrap().push(values.to_vec());
            Ok(())
        };

        // Window and interval long enough that only the flush evaluates
        let config = EngineConfig::new(Duration::from_secs(60), Duration::from_secs(60)).unwrap();
        let engine = SlidingWindowEngine::new(config, aggregator).unwrap();

        let (reading_tx, reading_rx) = mpsc::channel(16);
        let (scaled_tx, scaled_rx) = mpsc::channel(16);
        let (peak_tx, peak_rx) = mpsc::channel(16);
        let (out_tx, out_rx) = mpsc::channel(16);
        let shutdown = CancellationToken::new();

        let handle = engine.start(peak_rx, out_tx, CancellationToken::new());
        let source = tokio::spawn(run_source(
            "sensor-2".to_string(),
            Duration::from_secs(5),
            StdRng::seed_from_u64(11),
            reading_tx,
            shutdown.clone(),
        ));
        let scale = tokio::spawn(run_scale_stage(reading_rx, scaled_tx, 10.0));
        let peak = tokio::spawn(run_peak_stage(scaled_rx, peak_tx, 16.0));
        let sink = tokio::spawn(run_log_sink(out_rx));

        sleep(Duration::from_secs(11)).await;
        shutdown.cancel();

        let report = handle.join().await.unwrap();

        assert_eq!(source.await.unwrap(), 3);
        assert_eq!(scale.await.unwrap(), 3);
        assert_eq!(peak.await.unwrap(), 3);
        assert_eq!(sink.await.unwrap(), 3);

        assert_eq!(report.forwarder.shutdown, ShutdownKind::InboundClosed);
        assert_eq!(report.forwarder.forwarded, 3);
        assert!(report.evaluator.flushed);

        let snapshots = snapshots.lock().unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].len(), 3);
        assert!(snapshots[0].iter().all(|v| *v >= 0.0 && *v < MAX_NOISE / 10.0));
    }
}
