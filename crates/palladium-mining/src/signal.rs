//! Wake-up signal shared by submitters and long-pollers.

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Notify;

/// Notifies template long-pollers of tip changes and shutdown.
///
/// Single-waiter-many-notifier: any thread that advances the chain or
/// flips the shutdown flag calls the notify side; waiters re-check
/// their condition after every wake-up.
#[derive(Debug, Default)]
pub struct TipSignal {
    notify: Notify,
    shutdown: AtomicBool,
}

impl TipSignal {
    pub fn new() -> Self {
        TipSignal::default()
    }

    /// Wake all current waiters; called after the tip advances.
    pub fn notify_tip_changed(&self) {
        self.notify.notify_waiters();
    }

    /// Request shutdown and release anyone blocked on the signal.
    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait until the next notification.
    pub async fn wait(&self) {
        self.notify.notified().await;
    }
}
