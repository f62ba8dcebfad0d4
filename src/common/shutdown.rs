use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::Notify;

/// One-shot stop signal shared between an owner and its background tasks.
#[derive(Debug, Default)]
pub struct Shutdown {
    is_shutdown: AtomicBool,
    notify: Notify,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every current and future waiter.
    pub fn shutdown(&self) {
        self.is_shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.is_shutdown.load(Ordering::SeqCst)
    }

    /// Resolve once `shutdown` has been called.
    pub async fn wait(&self) {
        // register before checking the flag so a concurrent shutdown is not missed
        let notified = self.notify.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }
}
