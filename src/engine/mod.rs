//! Sliding Window Engine
//!
//! Two activities share one [`WindowStore`]:
//!
//! ```text
//! inbound feed ──▶ forwarder ──▶ outbound feed
//!                     │ append
//!                     ▼
//!                WindowStore ◀── evict + snapshot ── evaluator (ticker / deadline)
//!                                                        │
//!                                                        ▼
//!                                                    Aggregator
//! ```
//!
//! ## Shutdown
//!
//! - Graceful: the inbound feed closes, the forwarder signals stop, the
//!   evaluator runs one final flush and both exit. The outbound feed is
//!   closed when the forwarder drops its sender.
//! - Abrupt: the cancellation token fires, both activities exit as soon as
//!   they observe it, no final evaluation runs, and the outbound feed is
//!   closed by the forwarder.

pub mod evaluator;
pub mod feed;
pub mod forwarder;

pub use evaluator::EvaluatorReport;
pub use feed::{send_unless_cancelled, Delivery};
pub use forwarder::{ForwarderReport, ShutdownKind};

use crate::aggregator::Aggregator;
use crate::config::{ConfigError, EngineConfig};
use crate::window::WindowStore;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub enum EngineError {
    Config(ConfigError),
    TaskFailed {
        task: &'static str,
        source: JoinError,
    },
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        EngineError::Config(err)
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::Config(e) => write!(f, "Engine configuration error: {}", e),
            EngineError::TaskFailed { task, source } => {
                write!(f, "Engine {} task failed: {}", task, source)
            }
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Config(e) => Some(e),
            EngineError::TaskFailed { source, .. } => Some(source),
        }
    }
}

/// Combined outcome of both activities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineReport {
    pub forwarder: ForwarderReport,
    pub evaluator: EvaluatorReport,
}

/// Create a feed channel sized from the engine configuration
pub fn feed_channel(config: &EngineConfig) -> (mpsc::Sender<f32>, mpsc::Receiver<f32>) {
    mpsc::channel(config.channel_buffer)
}

/// One engine instance: configuration plus its injected aggregator
pub struct SlidingWindowEngine {
    config: EngineConfig,
    aggregator: Arc<dyn Aggregator>,
}

impl SlidingWindowEngine {
    pub fn new<A: Aggregator>(config: EngineConfig, aggregator: A) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(Self {
            config,
            aggregator: Arc::new(aggregator),
        })
    }

    /// Spawn the forwarder and evaluator on the current tokio runtime.
    ///
    /// The engine takes ownership of the outbound sender; downstream sees
    /// the feed close once the forwarder exits. Timers are measured from the
    /// moment this is called.
    ///
    /// The engine listens on a child of `cancel`: cancelling the caller's
    /// token stops it, while [`EngineHandle::cancel`] stops only this engine.
    pub fn start(
        self,
        inbound: mpsc::Receiver<f32>,
        outbound: mpsc::Sender<f32>,
        cancel: CancellationToken,
    ) -> EngineHandle {
        let started = Instant::now();
        let cancel = cancel.child_token();
        let store = Arc::new(WindowStore::new(self.config.window_duration));
        let stop = CancellationToken::new();

        log::info!("🚀 Starting sliding window engine");
        log::info!("   ├─ Window: {}ms", self.config.window_duration.as_millis());
        log::info!("   └─ Evaluation interval: {}ms", self.config.evaluation_interval.as_millis());

        let forwarder = tokio::spawn(forwarder::run_forwarder(
            inbound,
            outbound,
            store.clone(),
            stop.clone(),
            cancel.clone(),
        ));

        let evaluator = tokio::spawn(evaluator::run_evaluator(
            store.clone(),
            self.aggregator,
            started,
            self.config.evaluation_interval,
            stop,
            cancel.clone(),
        ));

        EngineHandle {
            forwarder,
            evaluator,
            cancel,
            store,
        }
    }
}

/// Handle to a running engine
pub struct EngineHandle {
    forwarder: JoinHandle<ForwarderReport>,
    evaluator: JoinHandle<EvaluatorReport>,
    cancel: CancellationToken,
    store: Arc<WindowStore>,
}

impl EngineHandle {
    /// Cancel this engine only (abrupt shutdown). Idempotent.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Samples currently buffered, including ones not yet evicted
    pub fn buffered(&self) -> usize {
        self.store.len()
    }

    /// Wait for both activities to exit
    pub async fn join(self) -> Result<EngineReport, EngineError> {
        let forwarder = match self.forwarder.await {
            Ok(report) => report,
            Err(source) => {
                // Stop was never signalled, so the evaluator has to be cancelled
                self.cancel.cancel();
                return Err(EngineError::TaskFailed {
                    task: "forwarder",
                    source,
                });
            }
        };
        let evaluator = self.evaluator.await.map_err(|source| EngineError::TaskFailed {
            task: "evaluator",
            source,
        })?;

        log::info!(
            "✅ Engine stopped: {} received, {} forwarded, {} evaluations",
            forwarder.received,
            forwarder.forwarded,
            evaluator.evaluations
        );

        Ok(EngineReport {
            forwarder,
            evaluator,
        })
    }
}
