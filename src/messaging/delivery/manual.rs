//! Hand-driven transport for tests and scripted demos.
//!
//! Nothing happens on its own: the caller decides when each message is
//! delivered or read.

use dashmap::DashMap;

use crate::messaging::core::ids::MessageId;
use crate::messaging::delivery::transport::{DeliverySink, DeliveryTransport};

/// Transport whose acknowledgements are triggered explicitly.
#[derive(Default)]
pub struct ManualTransport {
    pending: DashMap<MessageId, DeliverySink>,
}

impl ManualTransport {
    /// Create an empty transport.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `message_id` was dispatched and not yet read or cancelled.
    #[must_use]
    pub fn is_pending(&self, message_id: &MessageId) -> bool {
        self.pending.contains_key(message_id)
    }

    /// Report the message as delivered. Returns `false` if it is not pending.
    pub fn deliver(&self, message_id: &MessageId) -> bool {
        self.pending
            .get(message_id)
            .is_some_and(|sink| sink.on_delivered(message_id.clone()))
    }

    /// Report the message as read and stop tracking it.
    /// Returns `false` if it is not pending.
    pub fn read(&self, message_id: &MessageId) -> bool {
        self.pending
            .remove(message_id)
            .is_some_and(|(id, sink)| sink.on_read(id))
    }
}

impl DeliveryTransport for ManualTransport {
    fn dispatch(&self, message_id: &MessageId, sink: &DeliverySink) {
        self.pending.insert(message_id.clone(), sink.clone());
    }

    fn cancel(&self, message_id: &MessageId) -> bool {
        self.pending.remove(message_id).is_some()
    }

    fn cancel_all(&self) -> usize {
        let count = self.pending.len();
        self.pending.clear();
        count
    }

    fn pending(&self) -> usize {
        self.pending.len()
    }
}
