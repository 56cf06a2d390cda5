//! Conversation store for tutor/learner messaging.
//!
//! Layout:
//! - [`core`]: identifiers, enums, data model, errors, configuration
//! - [`store`]: synchronous state transitions and derived views
//! - [`delivery`]: acknowledgement transports
//! - [`service`]: the shared, explicitly disposed store instance
//! - [`fixtures`]: seed data

pub mod core;
pub mod delivery;
pub mod fixtures;
pub mod service;
pub mod store;

pub use core::{
    ContentKind, Conversation, ConversationId, DeliveryConfig, FixtureConfig, IdError, Message,
    MessageId, MessageStatus, MessagingConfig, MessagingConfigBuilder, MessagingError,
    MessagingResult, Participant, ParticipantId, ParticipantRole, Reaction, TypingConfig,
    TypingMarker,
};
pub use delivery::{DeliverySink, DeliveryTransport, ManualTransport, SimulatedTransport};
pub use service::MessagingService;
pub use store::{
    ConversationListItem, ConversationStore, LastMessagePreview, ParticipantSummary, StoreEvent,
    ThreadMessage, TimeLabel,
};
