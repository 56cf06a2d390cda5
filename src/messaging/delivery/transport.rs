//! Acknowledgement interface between the store and a message transport.

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;

use crate::messaging::core::ids::MessageId;
use crate::messaging::store::events::StoreEvent;

/// Channel end a transport uses to report acknowledgements.
///
/// Reports are queued and applied to the store by the service's event pump,
/// one at a time.
#[derive(Clone, Debug)]
pub struct DeliverySink {
    tx: UnboundedSender<StoreEvent>,
}

impl DeliverySink {
    /// Wrap the sending half of the event channel.
    #[must_use]
    pub const fn new(tx: UnboundedSender<StoreEvent>) -> Self {
        Self { tx }
    }

    /// The message reached the recipient.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn on_delivered(&self, message_id: MessageId) -> bool {
        self.send(StoreEvent::Delivered(message_id))
    }

    /// The recipient read the message.
    ///
    /// Returns `false` once the receiving side is gone.
    pub fn on_read(&self, message_id: MessageId) -> bool {
        self.send(StoreEvent::Read(message_id))
    }

    /// Queue an arbitrary event.
    pub fn send(&self, event: StoreEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// A transport that acknowledges sent messages.
///
/// Implementations must be cancellable per message so deleting a message
/// stops its pending acknowledgements.
pub trait DeliveryTransport: Send + Sync {
    /// Start tracking a freshly sent message; report progress through `sink`.
    fn dispatch(&self, message_id: &MessageId, sink: &DeliverySink);

    /// Stop tracking a message. Returns `true` if it was still pending.
    fn cancel(&self, message_id: &MessageId) -> bool;

    /// Stop tracking everything. Returns how many messages were pending.
    fn cancel_all(&self) -> usize;

    /// Number of messages still awaiting acknowledgement.
    fn pending(&self) -> usize;
}

impl<T: DeliveryTransport + ?Sized> DeliveryTransport for Arc<T> {
    fn dispatch(&self, message_id: &MessageId, sink: &DeliverySink) {
        (**self).dispatch(message_id, sink);
    }

    fn cancel(&self, message_id: &MessageId) -> bool {
        (**self).cancel(message_id)
    }

    fn cancel_all(&self) -> usize {
        (**self).cancel_all()
    }

    fn pending(&self) -> usize {
        (**self).pending()
    }
}
