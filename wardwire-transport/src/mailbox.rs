//! Single-slot inbound mailbox.
//!
//! The handoff point between a background receive task and the foreground:
//! one slot, last write wins. If the consumer has not drained the previous
//! payload when a new one arrives, the old payload is overwritten — the
//! at-most-one-pending-message policy of this design. The receive task is
//! never blocked by a slow consumer.

use std::sync::Mutex;

use tokio::sync::Notify;

/// Thread-safe single-slot buffer with last-write-wins overwrite semantics.
#[derive(Debug, Default)]
pub struct Mailbox {
    slot: Mutex<Option<Vec<u8>>>,
    notify: Notify,
}

impl Mailbox {
    /// Empty mailbox.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deposit a payload, replacing any undrained one.
    pub fn post(&self, payload: Vec<u8>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(payload);
        }
        self.notify.notify_one();
    }

    /// Drain the slot without waiting.
    pub fn take(&self) -> Option<Vec<u8>> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }

    /// Wait until a payload is available and drain it.
    pub async fn recv(&self) -> Vec<u8> {
        loop {
            if let Some(payload) = self.take() {
                return payload;
            }
            self.notify.notified().await;
        }
    }
}
