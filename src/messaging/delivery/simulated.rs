//! Timer-driven stand-in for a real acknowledgement protocol.
//!
//! Every dispatched message gets one tokio task that reports `delivered`
//! after `delivered_after` and `read` after `read_after`, both measured from
//! dispatch. Task handles are kept per message id so a deletion can abort
//! them.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::messaging::core::config::DeliveryConfig;
use crate::messaging::core::ids::MessageId;
use crate::messaging::delivery::transport::{DeliverySink, DeliveryTransport};

/// Simulated transport with cancellable per-message timers.
pub struct SimulatedTransport {
    config: DeliveryConfig,
    timers: Arc<DashMap<MessageId, JoinHandle<()>>>,
}

impl SimulatedTransport {
    /// Create a transport with the given delays.
    #[must_use]
    pub fn new(config: DeliveryConfig) -> Self {
        Self {
            config,
            timers: Arc::new(DashMap::new()),
        }
    }
}

impl DeliveryTransport for SimulatedTransport {
    /// Must be called from within a tokio runtime.
    fn dispatch(&self, message_id: &MessageId, sink: &DeliverySink) {
        let delivered_after = self.config.delivered_after();
        let read_gap = self.config.read_after().saturating_sub(delivered_after);
        let id = message_id.clone();
        let sink = sink.clone();
        let timers = Arc::clone(&self.timers);

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delivered_after).await;
            sink.on_delivered(id.clone());
            tokio::time::sleep(read_gap).await;
            sink.on_read(id.clone());
            timers.remove(&id);
        });

        if let Some(previous) = self.timers.insert(message_id.clone(), handle) {
            previous.abort();
        }
        debug!(message_id = %message_id, ?delivered_after, "delivery simulation scheduled");
    }

    fn cancel(&self, message_id: &MessageId) -> bool {
        match self.timers.remove(message_id) {
            Some((_, handle)) => {
                let was_pending = !handle.is_finished();
                handle.abort();
                debug!(message_id = %message_id, was_pending, "delivery simulation cancelled");
                was_pending
            }
            None => false,
        }
    }

    fn cancel_all(&self) -> usize {
        let mut cancelled = 0;
        self.timers.retain(|_, handle| {
            if !handle.is_finished() {
                cancelled += 1;
            }
            handle.abort();
            false
        });
        cancelled
    }

    fn pending(&self) -> usize {
        self.timers
            .iter()
            .filter(|entry| !entry.value().is_finished())
            .count()
    }
}

impl Drop for SimulatedTransport {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
