//! Error types for the messaging subsystem.

use thiserror::Error;

use crate::messaging::core::ids::IdError;

/// Messaging subsystem error type.
///
/// Unknown conversation/message ids are not represented here: the store
/// treats them as silent no-ops because stale references from timers and
/// views are expected.
#[derive(Debug, Error)]
pub enum MessagingError {
    /// A send was attempted with no conversation selected.
    #[error("no active conversation")]
    NoActiveConversation,
    /// A send was attempted with blank content.
    #[error("message content is empty")]
    EmptyContent,
    /// An identifier failed validation.
    #[error("invalid id: {0}")]
    InvalidId(#[from] IdError),
    /// A conversation could not be built without breaking an invariant.
    #[error("invalid conversation: {0}")]
    InvalidConversation(String),
    /// Invalid configuration or unsupported values.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// The service was disposed before the operation ran.
    #[error("messaging service is closed")]
    ServiceClosed,
}

/// Convenience result alias for messaging operations.
pub type MessagingResult<T> = Result<T, MessagingError>;
