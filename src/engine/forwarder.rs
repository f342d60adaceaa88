//! Forwarder activity: buffer every inbound sample and pass it downstream

use super::feed::{send_unless_cancelled, Delivery};
use crate::window::{Sample, WindowStore};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Why the forwarder stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownKind {
    /// Upstream closed the inbound feed; the evaluator flushes once
    InboundClosed,
    /// External cancellation; no final evaluation
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwarderReport {
    /// Samples taken from the inbound feed and appended to the window
    pub received: u64,
    /// Samples written to the outbound feed
    pub forwarded: u64,
    /// Samples whose forward lost to cancellation or hit a closed downstream
    pub undelivered: u64,
    pub shutdown: ShutdownKind,
}

/// Run until the inbound feed closes or `cancel` fires.
///
/// On exit `stop` is signalled and the outbound sender is dropped, which
/// closes the outbound feed on both shutdown paths.
pub(crate) async fn run_forwarder(
    mut inbound: mpsc::Receiver<f32>,
    outbound: mpsc::Sender<f32>,
    store: Arc<WindowStore>,
    stop: CancellationToken,
    cancel: CancellationToken,
) -> ForwarderReport {
    let mut received = 0u64;
    let mut forwarded = 0u64;
    let mut undelivered = 0u64;
    let mut downstream_closed = false;

    let shutdown = loop {
        tokio::select! {
            biased;

            _ = cancel.cancelled() => break ShutdownKind::Cancelled,

            item = inbound.recv() => {
                let Some(value) = item else {
                    break ShutdownKind::InboundClosed;
                };

                log::debug!("✅ observe <- {:.3}", value);
                store.append(Sample::now(value));
                received += 1;

                match send_unless_cancelled(&cancel, &outbound, value).await {
                    Delivery::Delivered => forwarded += 1,
                    Delivery::Cancelled => {
                        undelivered += 1;
                        break ShutdownKind::Cancelled;
                    }
                    Delivery::Closed => {
                        undelivered += 1;
                        if !downstream_closed {
                            log::warn!("⚠️  Outbound feed closed by downstream, samples are still buffered");
                            downstream_closed = true;
                        }
                    }
                }
            }
        }
    };

    stop.cancel();
    drop(outbound);

    match shutdown {
        ShutdownKind::InboundClosed => {
            log::info!("⚠️  Inbound feed closed, forwarder stopping ({} samples)", received)
        }
        ShutdownKind::Cancelled => {
            log::info!("🛑 Forwarder cancelled after {} samples, outbound feed closed", received)
        }
    }

    ForwarderReport {
        received,
        forwarded,
        undelivered,
        shutdown,
    }
}
