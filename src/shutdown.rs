use tokio::sync::watch;
use tokio::time::Duration;
use tracing::{info, warn};

/// Sending half of the interrupt flag.
#[derive(Debug, Clone)]
pub struct ShutdownTrigger(watch::Sender<bool>);

impl ShutdownTrigger {
    pub fn trigger(&self) {
        self.0.send_replace(true);
    }
}

/// Receiving half, checked by the search loop between queries.
#[derive(Debug, Clone)]
pub struct Shutdown(watch::Receiver<bool>);

impl Shutdown {
    pub fn channel() -> (ShutdownTrigger, Shutdown) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger(tx), Shutdown(rx))
    }

    /// A shutdown flag wired to Ctrl-C.
    pub fn on_ctrl_c() -> Shutdown {
        let (trigger, shutdown) = Shutdown::channel();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Interrupt received, stopping after the current query");
                    trigger.trigger();
                }
                Err(e) => warn!("Unable to listen for Ctrl-C: {}", e),
            }
        });
        shutdown
    }

    pub fn is_triggered(&self) -> bool {
        *self.0.borrow()
    }

    /// Sleep for `duration` unless interrupted first. Returns `true` when
    /// the sleep was cut short.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return true;
        }
        let rx = &mut self.0;
        let interrupted = async move {
            if rx.wait_for(|stop| *stop).await.is_err() {
                // Trigger dropped: nobody can interrupt us any more.
                std::future::pending::<()>().await;
            }
        };
        tokio::select! {
            _ = tokio::time::sleep(duration) => false,
            _ = interrupted => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sleep_completes_without_trigger() {
        let (_trigger, mut shutdown) = Shutdown::channel();
        assert!(!shutdown.sleep(Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_trigger_cuts_sleep_short() {
        let (trigger, mut shutdown) = Shutdown::channel();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });
        let interrupted = tokio::time::timeout(
            Duration::from_secs(5),
            shutdown.sleep(Duration::from_secs(60)),
        )
        .await
        .unwrap();
        assert!(interrupted);
        assert!(shutdown.is_triggered());
    }

    #[tokio::test]
    async fn test_dropped_trigger_still_sleeps() {
        let (trigger, mut shutdown) = Shutdown::channel();
        drop(trigger);
        assert!(!shutdown.sleep(Duration::from_millis(5)).await);
    }
}
