//! Message-bus contract and the in-process implementation.
//!
//! The real bus (an MQTT broker or similar) is outside this system. The
//! contract is deliberately thin: `publish(topic, bytes)` and
//! `subscribe(topic)` delivering payloads byte-for-byte as published, with
//! no transformation, no delivery ordering across sessions, and no retry.
//!
//! [`MemoryBus`] implements the contract in-process for tests and demos:
//! per-subscriber bounded queues, try-send delivery (a slow subscriber loses
//! messages rather than blocking the publisher).

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::mpsc;

use crate::error::TransportError;

/// Bound of each subscriber queue.
const MAX_QUEUE_DEPTH: usize = 32;

/// A stream of raw payloads from one subscribed topic.
#[derive(Debug)]
pub struct Subscription {
    rx: mpsc::Receiver<Vec<u8>>,
}

impl Subscription {
    /// Next payload, or `None` once the bus side is gone.
    pub async fn next(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

/// Publish/subscribe transport contract.
///
/// Implementations must hand subscribers each published payload
/// byte-for-byte. Publish failures are per-call errors; they must not tear
/// down other subscriptions.
#[async_trait]
pub trait MessageBus: Send + Sync {
    /// Publish a payload to a topic.
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;

    /// Subscribe to a topic, receiving every subsequent payload.
    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError>;
}

/// In-process bus: a topic table of subscriber queues.
#[derive(Debug, Default)]
pub struct MemoryBus {
    topics: DashMap<String, Vec<mpsc::Sender<Vec<u8>>>>,
}

impl MemoryBus {
    /// Fresh bus with no topics.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MessageBus for MemoryBus {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        if let Some(mut senders) = self.topics.get_mut(topic) {
            // Drop subscribers whose receiver is gone; skip full queues
            // (bounded-queue loss is the contract, not an error).
            senders.retain(|tx| !tx.is_closed());
            for tx in senders.iter() {
                let _ = tx.try_send(payload.clone());
            }
        }
        Ok(())
    }

    async fn subscribe(&self, topic: &str) -> Result<Subscription, TransportError> {
        let (tx, rx) = mpsc::channel(MAX_QUEUE_DEPTH);
        self.topics.entry(topic.to_string()).or_default().push(tx);
        Ok(Subscription { rx })
    }
}
