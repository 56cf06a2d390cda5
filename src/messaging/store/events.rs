//! Events applied to the store outside of direct user actions.

use chrono::{DateTime, Utc};

use crate::messaging::core::ids::{ConversationId, MessageId};
use crate::messaging::core::kinds::MessageStatus;

/// An asynchronous state change reported by a transport or a timer.
///
/// Every event may refer to state that no longer exists (a deleted message,
/// a replaced typing marker); applying such an event is a no-op.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The recipient's device acknowledged the message.
    Delivered(MessageId),
    /// The recipient read the message.
    Read(MessageId),
    /// The local typing marker set at `since` went idle.
    TypingExpired {
        /// Conversation whose marker expired.
        conversation_id: ConversationId,
        /// Timestamp of the marker that was armed.
        since: DateTime<Utc>,
    },
}

impl StoreEvent {
    /// Target status for acknowledgement events.
    #[must_use]
    pub const fn target_status(&self) -> Option<MessageStatus> {
        match self {
            Self::Delivered(_) => Some(MessageStatus::Delivered),
            Self::Read(_) => Some(MessageStatus::Read),
            Self::TypingExpired { .. } => None,
        }
    }
}
