use crate::error::CaptureError;
use std::time::Duration;
use tokio::sync::watch;

/// Preview readiness, set by the adapter whenever the preview surface has
/// (re-)initialized and cleared by the controller before mode or facing
/// changes.
#[derive(Clone)]
pub struct ReadySignal {
    tx: std::sync::Arc<watch::Sender<bool>>,
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadySignal {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self {
            tx: std::sync::Arc::new(tx),
        }
    }

    pub fn notify_ready(&self) {
        self.tx.send_replace(true);
    }

    pub fn reset(&self) {
        self.tx.send_replace(false);
    }

    pub fn is_ready(&self) -> bool {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Wait until ready, failing with [`CaptureError::NotReady`] after `timeout`
    pub async fn wait(&self, timeout: Duration) -> Result<(), CaptureError> {
        let mut rx = self.tx.subscribe();
        let ready = async move { rx.wait_for(|ready| *ready).await.map(|_| ()) };
        match tokio::time::timeout(timeout, ready).await {
            Ok(Ok(())) => Ok(()),
            // the sender lives in self, a closed channel cannot happen here
            Ok(Err(_)) => Err(CaptureError::NotReady),
            Err(_) => Err(CaptureError::NotReady),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_wait_returns_when_already_ready() {
        let signal = ReadySignal::new();
        signal.notify_ready();
        signal.wait(Duration::from_millis(10)).await.unwrap();
    }

    #[tokio::test]
    async fn test_wait_times_out() {
        let signal = ReadySignal::new();
        let result = signal.wait(Duration::from_millis(20)).await;
        assert!(matches!(result, Err(CaptureError::NotReady)));
    }

    #[tokio::test]
    async fn test_wait_wakes_on_notify() {
        let signal = ReadySignal::new();
        let notifier = signal.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            notifier.notify_ready();
        });
        signal.wait(Duration::from_millis(500)).await.unwrap();
        assert!(signal.is_ready());
    }

    #[test]
    fn test_reset() {
        let signal = ReadySignal::new();
        signal.notify_ready();
        signal.reset();
        assert!(!signal.is_ready());
    }
}
