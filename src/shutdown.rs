//! Cooperative shutdown signal shared by the long-running cycles.

use std::time::Duration;

use tokio::sync::watch;

/// Sending half; flips the flag once.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        let _ = self.tx.send(true);
    }
}

/// Receiving half, cloned into every worker.
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Shutdown { rx })
    }

    /// A signal that never fires.
    pub fn never() -> Shutdown {
        let (trigger, shutdown) = Self::channel();
        // With the sender gone the flag stays false and waits never resolve.
        drop(trigger);
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Sleep for `duration` unless shutdown arrives first.
    /// Returns true if the full duration elapsed.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        let mut rx = self.rx.clone();
        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            Ok(_) = rx.wait_for(|stopped| *stopped) => false,
        }
    }

    /// Trigger on Ctrl-C.
    pub fn listen_for_ctrl_c(trigger: ShutdownTrigger) {
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Shutdown requested, finishing current work");
                trigger.trigger();
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_interrupted_by_trigger() {
        let (trigger, shutdown) = Shutdown::channel();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.sleep(Duration::from_millis(1)).await);

        let waiter = shutdown.clone();
        let task = tokio::spawn(async move { waiter.sleep(Duration::from_secs(60)).await });
        trigger.trigger();
        assert!(!task.await.unwrap());
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_never_fires() {
        let shutdown = Shutdown::never();
        assert!(!shutdown.is_triggered());
        assert!(shutdown.sleep(Duration::from_millis(1)).await);
    }
}
