//! Participants, messages, and conversations.
//!
//! `Conversation` keeps its participant pair and message sequence private so
//! the ordering and ownership invariants can only be changed through checked
//! methods.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::ids::{ConversationId, MessageId, ParticipantId};
use crate::messaging::core::kinds::{ContentKind, MessageStatus, ParticipantRole};

/// A user identity attached to conversations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    /// Participant identifier.
    pub id: ParticipantId,
    /// Display name.
    pub name: String,
    /// Avatar URL.
    pub avatar: String,
    /// Role on the platform.
    pub role: ParticipantRole,
    /// Presence flag.
    pub online: bool,
    /// Last time the participant was seen online.
    pub last_seen: Option<DateTime<Utc>>,
}

impl Participant {
    /// Create an online participant without a last-seen timestamp.
    #[must_use]
    pub fn new(
        id: ParticipantId,
        name: impl Into<String>,
        avatar: impl Into<String>,
        role: ParticipantRole,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            avatar: avatar.into(),
            role,
            online: true,
            last_seen: None,
        }
    }

    /// Mark the participant offline since `last_seen`.
    #[must_use]
    pub const fn offline_since(mut self, last_seen: DateTime<Utc>) -> Self {
        self.online = false;
        self.last_seen = Some(last_seen);
        self
    }
}

/// An emoji annotation on a message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    /// The emoji symbol.
    pub emoji: String,
    /// Participants who reacted with this entry.
    pub users: Vec<ParticipantId>,
}

/// A single message in a conversation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Message identifier.
    pub id: MessageId,
    /// Owning conversation.
    pub conversation_id: ConversationId,
    /// Author of the message.
    pub sender_id: ParticipantId,
    /// Text, emoji, or image URL.
    pub content: String,
    /// Kind of content.
    pub kind: ContentKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    status: MessageStatus,
    /// Reactions in insertion order.
    #[serde(default)]
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// Build a freshly sent message.
    #[must_use]
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        sender_id: ParticipantId,
        content: impl Into<String>,
        kind: ContentKind,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            content: content.into(),
            kind,
            timestamp,
            status: MessageStatus::Sent,
            reactions: Vec::new(),
        }
    }

    /// Builder-style initial status, for seeded history.
    #[must_use]
    pub const fn with_status(mut self, status: MessageStatus) -> Self {
        self.status = status;
        self
    }

    /// Current delivery status.
    #[must_use]
    pub const fn status(&self) -> MessageStatus {
        self.status
    }

    /// Whether the message has been read. Derived from the status.
    #[must_use]
    pub const fn is_read(&self) -> bool {
        self.status.is_read()
    }

    /// Advance the status if `next` is a forward transition.
    ///
    /// Returns `true` when the status changed.
    pub fn advance_to(&mut self, next: MessageStatus) -> bool {
        if self.status.can_advance_to(next) {
            self.status = next;
            true
        } else {
            false
        }
    }
}

/// Transient "someone is typing" marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingMarker {
    /// Who is typing.
    pub participant_id: ParticipantId,
    /// When the marker was set.
    pub timestamp: DateTime<Utc>,
}

/// A two-party conversation with a chronological message sequence.
#[derive(Clone, Debug, Serialize)]
pub struct Conversation {
    /// Conversation identifier.
    pub id: ConversationId,
    participants: [Participant; 2],
    messages: Vec<Message>,
    /// Current typing marker, if any.
    pub typing: Option<TypingMarker>,
}

impl Conversation {
    /// Create an empty conversation between two distinct participants.
    ///
    /// # Errors
    /// Returns `InvalidConversation` if both participants share an id.
    pub fn new(id: ConversationId, first: Participant, second: Participant) -> MessagingResult<Self> {
        if first.id == second.id {
            return Err(MessagingError::InvalidConversation(format!(
                "{id}: participants must be distinct (both are {})",
                first.id
            )));
        }
        Ok(Self {
            id,
            participants: [first, second],
            messages: Vec::new(),
            typing: None,
        })
    }

    /// Seed the conversation with existing messages, sorted by timestamp.
    ///
    /// # Errors
    /// Returns `InvalidConversation` if a message belongs to another
    /// conversation or was sent by a non-participant.
    pub fn with_messages(mut self, mut messages: Vec<Message>) -> MessagingResult<Self> {
        for message in &messages {
            self.check_ownership(message)?;
        }
        messages.sort_by_key(|m| m.timestamp);
        self.messages = messages;
        Ok(self)
    }

    /// Both participants.
    #[must_use]
    pub const fn participants(&self) -> &[Participant; 2] {
        &self.participants
    }

    /// Messages in chronological order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Whether `participant_id` is one of the two participants.
    #[must_use]
    pub fn has_participant(&self, participant_id: &ParticipantId) -> bool {
        self.participants.iter().any(|p| &p.id == participant_id)
    }

    /// The first participant that is not `viewer`.
    ///
    /// Participants are distinct, so this is always `Some`; when `viewer` is
    /// not part of the conversation the first participant is returned.
    #[must_use]
    pub fn other_participant(&self, viewer: &ParticipantId) -> Option<&Participant> {
        self.participants.iter().find(|p| &p.id != viewer)
    }

    /// Most recent message.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Look up a message by id.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Mutable lookup. Content stays untouched by callers; only status and
    /// reactions change.
    pub(crate) fn message_mut(&mut self, id: &MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| &m.id == id)
    }

    /// Mutable iteration over all messages.
    pub(crate) fn messages_mut(&mut self) -> impl Iterator<Item = &mut Message> {
        self.messages.iter_mut()
    }

    /// Number of messages `viewer` has not read yet.
    #[must_use]
    pub fn unread_count(&self, viewer: &ParticipantId) -> usize {
        self.messages
            .iter()
            .filter(|m| !m.is_read() && &m.sender_id != viewer)
            .count()
    }

    /// Earliest timestamp a new message may carry.
    #[must_use]
    pub fn next_timestamp(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        self.last_message().map_or(now, |last| last.timestamp.max(now))
    }

    /// Append a message at the end of the sequence.
    ///
    /// # Errors
    /// Returns `InvalidConversation` if the message belongs elsewhere, its
    /// sender is not a participant, or it predates the last message.
    pub fn append(&mut self, message: Message) -> MessagingResult<()> {
        self.check_ownership(&message)?;
        if let Some(last) = self.last_message() {
            if message.timestamp < last.timestamp {
                return Err(MessagingError::InvalidConversation(format!(
                    "{}: message {} predates the last message",
                    self.id, message.id
                )));
            }
        }
        self.messages.push(message);
        Ok(())
    }

    /// Remove a message permanently.
    pub fn remove_message(&mut self, id: &MessageId) -> Option<Message> {
        let index = self.messages.iter().position(|m| &m.id == id)?;
        Some(self.messages.remove(index))
    }

    fn check_ownership(&self, message: &Message) -> MessagingResult<()> {
        if message.conversation_id != self.id {
            return Err(MessagingError::InvalidConversation(format!(
                "message {} belongs to {}, not {}",
                message.id, message.conversation_id, self.id
            )));
        }
        if !self.has_participant(&message.sender_id) {
            return Err(MessagingError::InvalidConversation(format!(
                "{}: sender {} is not a participant",
                self.id, message.sender_id
            )));
        }
        Ok(())
    }
}
