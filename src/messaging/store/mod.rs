//! Conversation store: synchronous state transitions and derived views.

pub mod conversation_store;
pub mod events;
pub mod views;

#[cfg(test)]
mod proptests;

pub use conversation_store::ConversationStore;
pub use events::StoreEvent;
pub use views::{
    ConversationListItem, LastMessagePreview, ParticipantSummary, ThreadMessage, TimeLabel,
    matches_search, other_participant,
};
