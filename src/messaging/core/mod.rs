//! Core messaging types and identifiers.

pub mod config;
pub mod errors;
pub mod ids;
pub mod kinds;
pub mod model;

pub use config::{
    DeliveryConfig, FixtureConfig, MessagingConfig, MessagingConfigBuilder, TypingConfig,
};
pub use errors::{MessagingError, MessagingResult};
pub use ids::{ConversationId, IdError, MessageId, ParticipantId};
pub use kinds::{ContentKind, MessageStatus, ParticipantRole};
pub use model::{Conversation, Message, Participant, Reaction, TypingMarker};
