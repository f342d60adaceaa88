//! Outbound writes that give way to cancellation

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Outcome of one forward attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// Cancellation won the race; expected during shutdown, not a failure
    Cancelled,
    /// Downstream dropped its receiver
    Closed,
}

/// Send `value` unless `cancel` fires first
///
/// Cancellation has the highest priority: an already-cancelled token skips
/// the send entirely, and if both become ready together cancellation wins.
pub async fn send_unless_cancelled<T>(
    cancel: &CancellationToken,
    tx: &mpsc::Sender<T>,
    value: T,
) -> Delivery {
    if cancel.is_cancelled() {
        return Delivery::Cancelled;
    }

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Delivery::Cancelled,
        result = tx.send(value) => match result {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Closed,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_delivers_when_not_cancelled() {
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();

        assert_eq!(send_unless_cancelled(&cancel, &tx, 1.5f32).await, Delivery::Delivered);
        assert_eq!(rx.recv().await, Some(1.5));
    }

    #[tokio::test]
    async fn test_cancelled_token_skips_send() {
        // Test: capacity is available, but cancellation still takes priority
        let (tx, mut rx) = mpsc::channel(4);
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(send_unless_cancelled(&cancel, &tx, 1.5f32).await, Delivery::Cancelled);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_unblocks_full_channel() {
        let (tx, mut rx) = mpsc::channel(1);
        let cancel = CancellationToken::new();
        tx.send(1.0f32).await.unwrap();

        let canceller = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        });

        assert_eq!(send_unless_cancelled(&cancel, &tx, 2.0f32).await, Delivery::Cancelled);
        assert_eq!(rx.recv().await, Some(1.0));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_closed_receiver_is_distinct_from_cancel() {
        let (tx, rx) = mpsc::channel::<f32>(1);
        drop(rx);

        let cancel = CancellationToken::new();
        assert_eq!(send_unless_cancelled(&cancel, &tx, 3.0).await, Delivery::Closed);
    }
}
