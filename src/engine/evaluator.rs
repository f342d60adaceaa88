//! Evaluator activity: periodic eviction and aggregation over the window

use crate::aggregator::Aggregator;
use crate::window::WindowStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{interval_at, sleep_until, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EvaluatorReport {
    /// Evaluation passes, including ones skipped over an empty window
    pub evaluations: u64,
    /// Passes that reached the aggregator
    pub callback_invocations: u64,
    pub callback_failures: u64,
    /// Whether the shutdown flush ran
    pub flushed: bool,
}

struct Evaluation {
    store: Arc<WindowStore>,
    aggregator: Arc<dyn Aggregator>,
    report: EvaluatorReport,
}

impl Evaluation {
    fn run(&mut self, now: Instant) {
        self.report.evaluations += 1;

        let snapshot = self.store.evict_and_snapshot(now);
        if snapshot.is_empty() {
            log::debug!("Window empty, skipping aggregation");
            return;
        }

        self.report.callback_invocations += 1;
        if let Err(e) = self.aggregator.aggregate(&snapshot) {
            self.report.callback_failures += 1;
            log::warn!("⚠️  Aggregator failed over {} samples: {}", snapshot.len(), e);
        }
    }
}

/// Run until `stop` (flush once, then exit) or `cancel` (exit immediately).
///
/// Interval ticks are scheduled from `started`, not from the previous
/// evaluation. A one-shot deadline at `started + window` guarantees the first
/// evaluation even when the interval is longer than the window; any
/// evaluation disarms it.
pub(crate) async fn run_evaluator(
    store: Arc<WindowStore>,
    aggregator: Arc<dyn Aggregator>,
    started: Instant,
    evaluation_interval: Duration,
    stop: CancellationToken,
    cancel: CancellationToken,
) -> EvaluatorReport {
    let mut ticker = interval_at(started + evaluation_interval, evaluation_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let first_deadline = sleep_until(started + store.window_duration());
    tokio::pin!(first_deadline);
    let mut first_pending = true;

    let mut evaluation = Evaluation {
        store,
        aggregator,
        report: EvaluatorReport::default(),
    };

    loop {
        // Order matters: cancellation beats the stop signal, and the ticker is
        // polled before the deadline so coincident timers evaluate once.
        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                log::info!("🛑 Evaluator cancelled, skipping final evaluation");
                break;
            }

            _ = stop.cancelled() => {
                log::info!("🔄 Performing final flush...");
                evaluation.run(Instant::now());
                evaluation.report.flushed = true;
                log::info!("✅ Final flush complete");
                break;
            }

            _ = ticker.tick() => {
                evaluation.run(Instant::now());
                first_pending = false;
            }

            _ = &mut first_deadline, if first_pending => {
                log::debug!("⏰ Window deadline reached before first interval tick");
                evaluation.run(Instant::now());
                first_pending = false;
            }
        }
    }

    evaluation.report
}
