//! Session-wide cancellation signal, checked by every pipeline thread.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag the three pipeline threads poll between blocking waits.
#[derive(Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }
}

/// Installs a ctrl-c listener and exposes an async `wait()` alongside the
/// synchronous [`ShutdownSignal`] the worker threads poll.
pub struct ShutdownHandler {
    signal: ShutdownSignal,
    notify: Arc<tokio::sync::Notify>,
}

impl ShutdownHandler {
    pub fn new() -> Self {
        Self {
            signal: ShutdownSignal::new(),
            notify: Arc::new(tokio::sync::Notify::new()),
        }
    }

    /// Spawns the ctrl-c listener task. Consumes and returns self for chaining,
    /// mirroring `ShutdownHandler::new().install().await` at the call site.
    pub async fn install(self) -> Self {
        let signal = self.signal.clone();
        let notify = self.notify.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl-C received, requesting shutdown");
                signal.cancel();
                notify.notify_waiters();
            }
        });
        self
    }

    pub fn signal(&self) -> ShutdownSignal {
        self.signal.clone()
    }

    pub async fn wait(&self) {
        if self.signal.is_cancelled() {
            return;
        }
        self.notify.notified().await;
    }
}

impl Default for ShutdownHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signal_starts_uncancelled_and_latches() {
        let sig = ShutdownSignal::new();
        assert!(!sig.is_cancelled());
        sig.cancel();
        assert!(sig.is_cancelled());
        // cloned handles observe the same flag
        let sig2 = sig.clone();
        assert!(sig2.is_cancelled());
    }
}
