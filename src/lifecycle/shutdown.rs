//! Shutdown coordination.

use std::future::Future;
use tokio::sync::broadcast;

/// Process-wide stop signal.
///
/// Long-running tasks (API server, probe tasks) each hold a receiver. Clones
/// share one channel, which stays open while any clone is alive, so a task
/// only stops on an explicit `trigger`.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver for use inside `tokio::select!` loops.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Future that resolves once `trigger` is called.
    ///
    /// Subscribes immediately, so a trigger between this call and the first
    /// poll is not missed.
    pub fn signalled(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut rx = self.tx.subscribe();
        async move {
            let _ = rx.recv().await;
        }
    }

    /// Tell every subscriber to stop.
    pub fn trigger(&self) {
        let listeners = self.tx.send(()).unwrap_or(0);
        tracing::debug!(listeners, "Shutdown triggered");
    }

    /// Subscribers that have not yet dropped their receiver.
    pub fn listeners(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_clones_share_channel() {
        let shutdown = Shutdown::new();
        let clone = shutdown.clone();
        let mut rx = shutdown.subscribe();
        assert_eq!(clone.listeners(), 1);

        clone.trigger();
        assert!(rx.recv().await.is_ok());
    }

    #[tokio::test]
    async fn test_signalled_sees_early_trigger() {
        let shutdown = Shutdown::new();
        let signalled = shutdown.signalled();
        shutdown.trigger();

        tokio::time::timeout(Duration::from_secs(1), signalled)
            .await
            .expect("signalled future should resolve");
    }
}
