//! In-memory conversation store.
//!
//! The store is the single source of truth for conversation and message
//! state. Every operation is a synchronous state transition; scheduling,
//! transports, and locking live in [`crate::messaging::service`].

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::ids::{ConversationId, MessageId, ParticipantId};
use crate::messaging::core::kinds::{ContentKind, MessageStatus};
use crate::messaging::core::model::{Conversation, Message, Reaction, TypingMarker};
use crate::messaging::store::events::StoreEvent;

/// Conversation list, active selection, and search term for one user.
#[derive(Clone, Debug)]
pub struct ConversationStore {
    current_user: ParticipantId,
    conversations: Vec<Conversation>,
    active: Option<ConversationId>,
    search_term: String,
}

impl ConversationStore {
    /// Create a store owning `conversations`, viewed by `current_user`.
    ///
    /// # Errors
    /// Returns `InvalidConversation` if two conversations share an id.
    pub fn new(
        current_user: ParticipantId,
        conversations: Vec<Conversation>,
    ) -> MessagingResult<Self> {
        let mut seen = HashSet::new();
        for conversation in &conversations {
            if !seen.insert(&conversation.id) {
                return Err(MessagingError::InvalidConversation(format!(
                    "duplicate conversation id {}",
                    conversation.id
                )));
            }
        }

        Ok(Self {
            current_user,
            conversations,
            active: None,
            search_term: String::new(),
        })
    }

    /// The signed-in user.
    #[must_use]
    pub const fn current_user(&self) -> &ParticipantId {
        &self.current_user
    }

    /// All conversations in list order.
    #[must_use]
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    /// Look up a conversation.
    #[must_use]
    pub fn conversation(&self, id: &ConversationId) -> Option<&Conversation> {
        self.conversations.iter().find(|c| &c.id == id)
    }

    /// Id of the active conversation.
    #[must_use]
    pub const fn active_id(&self) -> Option<&ConversationId> {
        self.active.as_ref()
    }

    /// The active conversation.
    #[must_use]
    pub fn active_conversation(&self) -> Option<&Conversation> {
        self.active.as_ref().and_then(|id| self.conversation(id))
    }

    /// Current list filter.
    #[must_use]
    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    /// Look up a message in any conversation.
    #[must_use]
    pub fn message(&self, id: &MessageId) -> Option<&Message> {
        self.conversations.iter().find_map(|c| c.message(id))
    }

    /// Make `id` the active conversation and mark incoming messages read.
    ///
    /// Unknown ids leave the store untouched. Returns `true` if the
    /// selection happened.
    pub fn select_conversation(&mut self, id: &ConversationId) -> bool {
        let Some(conversation) = self.conversations.iter_mut().find(|c| &c.id == id) else {
            debug!(conversation_id = %id, "select ignored: unknown conversation");
            return false;
        };

        let mut marked = 0_usize;
        for message in conversation.messages_mut() {
            if message.sender_id != self.current_user && message.advance_to(MessageStatus::Read) {
                marked += 1;
            }
        }

        self.active = Some(id.clone());
        debug!(conversation_id = %id, marked, "conversation selected");
        true
    }

    /// Send a message in the active conversation, stamped with the current time.
    ///
    /// # Errors
    /// See [`Self::send_message_at`].
    pub fn send_message(&mut self, content: &str, kind: ContentKind) -> MessagingResult<MessageId> {
        self.send_message_at(content, kind, Utc::now())
    }

    /// Send a message in the active conversation.
    ///
    /// The new message is owned by the current user, starts as `sent`, and is
    /// stamped no earlier than the last message so the sequence stays ordered.
    ///
    /// # Errors
    /// Returns `NoActiveConversation` when nothing is selected and
    /// `EmptyContent` when `content` is blank. No state changes in either case.
    pub fn send_message_at(
        &mut self,
        content: &str,
        kind: ContentKind,
        now: DateTime<Utc>,
    ) -> MessagingResult<MessageId> {
        let active = self.active.as_ref().ok_or(MessagingError::NoActiveConversation)?;
        if content.trim().is_empty() {
            return Err(MessagingError::EmptyContent);
        }

        let conversation = self
            .conversations
            .iter_mut()
            .find(|c| &c.id == active)
            .ok_or(MessagingError::NoActiveConversation)?;

        let message = Message::new(
            MessageId::generate(),
            conversation.id.clone(),
            self.current_user.clone(),
            content,
            kind,
            conversation.next_timestamp(now),
        );
        let id = message.id.clone();
        conversation.append(message)?;

        debug!(conversation_id = %conversation.id, message_id = %id, %kind, "message sent");
        Ok(id)
    }

    /// Mark every listed message read, across conversations.
    ///
    /// Unknown ids are ignored. Returns the number of messages that changed.
    pub fn mark_read(&mut self, ids: &[MessageId]) -> usize {
        let wanted: HashSet<&MessageId> = ids.iter().collect();
        let mut changed = 0_usize;
        for message in self.conversations.iter_mut().flat_map(Conversation::messages_mut) {
            if wanted.contains(&message.id) && message.advance_to(MessageStatus::Read) {
                changed += 1;
            }
        }

        debug!(requested = ids.len(), changed, "messages marked read");
        changed
    }

    /// Remove a message from whichever conversation holds it.
    ///
    /// Idempotent: returns `None` when the id is already gone.
    pub fn delete_message(&mut self, id: &MessageId) -> Option<Message> {
        let removed = self
            .conversations
            .iter_mut()
            .find_map(|c| c.remove_message(id));

        match &removed {
            Some(message) => {
                debug!(message_id = %id, conversation_id = %message.conversation_id, "message deleted");
            }
            None => debug!(message_id = %id, "delete ignored: unknown message"),
        }
        removed
    }

    /// Append a reaction entry by the current user.
    ///
    /// Entries are never merged: reacting twice with the same emoji yields two
    /// entries. Returns `false` for unknown ids.
    pub fn add_reaction(&mut self, id: &MessageId, emoji: &str) -> bool {
        let Some(message) = self
            .conversations
            .iter_mut()
            .find_map(|c| c.message_mut(id))
        else {
            debug!(message_id = %id, "reaction ignored: unknown message");
            return false;
        };

        message.reactions.push(Reaction {
            emoji: emoji.to_string(),
            users: vec![self.current_user.clone()],
        });
        debug!(message_id = %id, emoji, "reaction added");
        true
    }

    /// Set or clear the current user's typing marker on the active conversation.
    ///
    /// Returns the marker that was set, if any.
    pub fn set_typing(&mut self, is_typing: bool) -> Option<TypingMarker> {
        self.set_typing_at(is_typing, Utc::now())
    }

    /// [`Self::set_typing`] with an explicit clock.
    pub fn set_typing_at(&mut self, is_typing: bool, now: DateTime<Utc>) -> Option<TypingMarker> {
        let active = self.active.clone()?;
        let conversation = self.conversations.iter_mut().find(|c| c.id == active)?;

        conversation.typing = is_typing.then(|| TypingMarker {
            participant_id: self.current_user.clone(),
            timestamp: now,
        });
        conversation.typing.clone()
    }

    /// Store the conversation-list filter term.
    pub fn search_conversations(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
    }

    /// Acknowledgement callback: the message reached the recipient.
    pub fn on_delivered(&mut self, id: &MessageId) -> bool {
        self.advance_status(id, MessageStatus::Delivered)
    }

    /// Acknowledgement callback: the recipient read the message.
    pub fn on_read(&mut self, id: &MessageId) -> bool {
        self.advance_status(id, MessageStatus::Read)
    }

    /// Apply an asynchronous event. Returns `true` if state changed.
    pub fn apply(&mut self, event: &StoreEvent) -> bool {
        match event {
            StoreEvent::Delivered(id) | StoreEvent::Read(id) => event
                .target_status()
                .is_some_and(|next| self.advance_status(id, next)),
            StoreEvent::TypingExpired {
                conversation_id,
                since,
            } => self.expire_typing(conversation_id, *since),
        }
    }

    fn advance_status(&mut self, id: &MessageId, next: MessageStatus) -> bool {
        let Some(message) = self
            .conversations
            .iter_mut()
            .find_map(|c| c.message_mut(id))
        else {
            debug!(message_id = %id, status = %next, "acknowledgement ignored: unknown message");
            return false;
        };

        let changed = message.advance_to(next);
        debug!(message_id = %id, status = %message.status(), changed, "acknowledgement applied");
        changed
    }

    fn expire_typing(&mut self, conversation_id: &ConversationId, since: DateTime<Utc>) -> bool {
        let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| &c.id == conversation_id)
        else {
            return false;
        };

        let is_same_marker = conversation
            .typing
            .as_ref()
            .is_some_and(|t| t.participant_id == self.current_user && t.timestamp == since);
        if is_same_marker {
            conversation.typing = None;
            debug!(%conversation_id, "typing marker expired");
        }
        is_same_marker
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::messaging::core::kinds::ParticipantRole;
    use crate::messaging::core::model::Participant;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id).unwrap()
    }

    fn cid(id: &str) -> ConversationId {
        ConversationId::new(id).unwrap()
    }

    fn mid(id: &str) -> MessageId {
        MessageId::new(id).unwrap()
    }

    fn participant(id: &str, name: &str) -> Participant {
        Participant::new(pid(id), name, "", ParticipantRole::Learner)
    }

    fn incoming(id: &str, conv: &str, sender: &str, minutes_ago: i64) -> Message {
        Message::new(
            mid(id),
            cid(conv),
            pid(sender),
            "salut",
            ContentKind::Text,
            Utc::now() - Duration::minutes(minutes_ago),
        )
    }

    /// `conv_1` (u1/u2, empty) and `conv_2` (u1/u3, two unread incoming).
    fn store() -> ConversationStore {
        let conv_1 = Conversation::new(cid("conv_1"), participant("u1", "Me"), participant("u2", "Clara"))
            .unwrap();
        let conv_2 = Conversation::new(cid("conv_2"), participant("u1", "Me"), participant("u3", "Thomas"))
            .unwrap()
            .with_messages(vec![
                incoming("m1", "conv_2", "u3", 10),
                incoming("m2", "conv_2", "u3", 5).with_status(MessageStatus::Delivered),
                incoming("m3", "conv_2", "u1", 1),
            ])
            .unwrap();
        ConversationStore::new(pid("u1"), vec![conv_1, conv_2]).unwrap()
    }

    #[test]
    fn test_rejects_duplicate_conversation_ids() {
        let a = Conversation::new(cid("conv_1"), participant("u1", "A"), participant("u2", "B")).unwrap();
        let b = a.clone();
        assert!(ConversationStore::new(pid("u1"), vec![a, b]).is_err());
    }

    #[test]
    fn test_send_then_acknowledge() {
        let mut store = store();
        assert!(store.select_conversation(&cid("conv_1")));

        let id = store.send_message("Bonjour", ContentKind::Text).unwrap();
        let conv = store.conversation(&cid("conv_1")).unwrap();
        assert_eq!(conv.messages().len(), 1);
        let msg = &conv.messages()[0];
        assert_eq!(msg.sender_id, pid("u1"));
        assert_eq!(msg.content, "Bonjour");
        assert_eq!(msg.status(), MessageStatus::Sent);
        assert_eq!(msg.kind, ContentKind::Text);
        assert_eq!(msg.conversation_id, cid("conv_1"));

        assert!(store.on_delivered(&id));
        assert_eq!(store.message(&id).unwrap().status(), MessageStatus::Delivered);
        assert!(store.on_read(&id));
        assert!(store.message(&id).unwrap().is_read());
    }

    #[test]
    fn test_send_without_active_conversation() {
        let mut store = store();
        let before: Vec<usize> = store.conversations().iter().map(|c| c.messages().len()).collect();
        let err = store.send_message("Bonjour", ContentKind::Text).unwrap_err();
        assert!(matches!(err, MessagingError::NoActiveConversation));
        let after: Vec<usize> = store.conversations().iter().map(|c| c.messages().len()).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn test_send_blank_content() {
        let mut store = store();
        store.select_conversation(&cid("conv_1"));
        let err = store.send_message("  \n\t", ContentKind::Text).unwrap_err();
        assert!(matches!(err, MessagingError::EmptyContent));
        assert!(store.conversation(&cid("conv_1")).unwrap().messages().is_empty());
    }

    #[test]
    fn test_send_keeps_timestamps_ordered() {
        let mut store = store();
        store.select_conversation(&cid("conv_2"));
        let past = Utc::now() - Duration::hours(1);
        store.send_message_at("late clock", ContentKind::Text, past).unwrap();
        let conv = store.conversation(&cid("conv_2")).unwrap();
        assert!(conv.messages().windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_select_marks_incoming_read() {
        let mut store = store();
        assert!(store.select_conversation(&cid("conv_2")));
        assert_eq!(store.active_id(), Some(&cid("conv_2")));

        assert!(store.message(&mid("m1")).unwrap().is_read());
        assert!(store.message(&mid("m2")).unwrap().is_read());
        // own message is left to the transport
        assert_eq!(store.message(&mid("m3")).unwrap().status(), MessageStatus::Sent);
    }

    #[test]
    fn test_select_unknown_is_noop() {
        let mut store = store();
        store.select_conversation(&cid("conv_1"));
        let before = format!("{store:?}");
        assert!(!store.select_conversation(&cid("conv_404")));
        assert_eq!(store.active_id(), Some(&cid("conv_1")));
        assert_eq!(format!("{store:?}"), before);
    }

    #[test]
    fn test_mark_read_ignores_unknown_ids() {
        let mut store = store();
        let changed = store.mark_read(&[mid("m1"), mid("m_missing")]);
        assert_eq!(changed, 1);
        assert!(store.message(&mid("m1")).unwrap().is_read());
        assert_eq!(store.message(&mid("m2")).unwrap().status(), MessageStatus::Delivered);
        assert_eq!(store.message(&mid("m3")).unwrap().status(), MessageStatus::Sent);
    }

    #[test]
    fn test_delete_is_idempotent() {
        let mut store = store();
        let removed = store.delete_message(&mid("m2")).unwrap();
        assert_eq!(removed.id, mid("m2"));
        let snapshot = format!("{store:?}");

        assert!(store.delete_message(&mid("m2")).is_none());
        assert_eq!(format!("{store:?}"), snapshot);

        let ids: Vec<_> = store
            .conversation(&cid("conv_2"))
            .unwrap()
            .messages()
            .iter()
            .map(|m| m.id.as_str())
            .collect();
        assert_eq!(ids, ["m1", "m3"]);
    }

    #[test]
    fn test_acknowledgement_after_delete_is_noop() {
        let mut store = store();
        store.select_conversation(&cid("conv_1"));
        let id = store.send_message("Bonjour", ContentKind::Text).unwrap();
        store.delete_message(&id);

        assert!(!store.apply(&StoreEvent::Delivered(id.clone())));
        assert!(!store.apply(&StoreEvent::Read(id.clone())));
        assert!(store.message(&id).is_none());
        assert!(store.conversation(&cid("conv_1")).unwrap().messages().is_empty());
    }

    #[test]
    fn test_late_delivered_does_not_regress() {
        let mut store = store();
        assert!(store.on_read(&mid("m3")));
        assert!(!store.on_delivered(&mid("m3")));
        assert_eq!(store.message(&mid("m3")).unwrap().status(), MessageStatus::Read);
    }

    #[test]
    fn test_apply_advances_to_event_status() {
        let mut store = store();
        assert!(store.apply(&StoreEvent::Delivered(mid("m3"))));
        assert_eq!(store.message(&mid("m3")).unwrap().status(), MessageStatus::Delivered);
        assert!(store.apply(&StoreEvent::Read(mid("m3"))));
        assert!(!store.apply(&StoreEvent::Delivered(mid("m3"))));
        assert!(store.message(&mid("m3")).unwrap().is_read());
        assert!(!store.add_reaction(&mid("gone"), "👍"));
    }

    #[test]
    fn test_reactions_stack() {
        let mut store = store();
        assert!(store.add_reaction(&mid("m1"), "👍"));
        assert!(store.add_reaction(&mid("m1"), "👍"));
        let reactions = &store.message(&mid("m1")).unwrap().reactions;
        assert_eq!(reactions.len(), 2);
        assert!(reactions.iter().all(|r| r.emoji == "👍" && r.users == vec![pid("u1")]));

        assert!(!store.add_reaction(&mid("m_missing"), "👍"));
    }

    #[test]
    fn test_typing_marker() {
        let mut store = store();
        assert!(store.set_typing(true).is_none());

        store.select_conversation(&cid("conv_1"));
        let now = Utc::now();
        let marker = store.set_typing_at(true, now).unwrap();
        assert_eq!(marker.participant_id, pid("u1"));
        assert_eq!(store.active_conversation().unwrap().typing, Some(marker));

        assert!(store.set_typing(false).is_none());
        assert!(store.active_conversation().unwrap().typing.is_none());
    }

    #[test]
    fn test_typing_expiry_only_clears_matching_marker() {
        let mut store = store();
        store.select_conversation(&cid("conv_1"));
        let first = Utc::now();
        let second = first + Duration::milliseconds(500);
        store.set_typing_at(true, first);
        store.set_typing_at(true, second);

        let stale = StoreEvent::TypingExpired {
            conversation_id: cid("conv_1"),
            since: first,
        };
        assert!(!store.apply(&stale));
        assert!(store.active_conversation().unwrap().typing.is_some());

        let fresh = StoreEvent::TypingExpired {
            conversation_id: cid("conv_1"),
            since: second,
        };
        assert!(store.apply(&fresh));
        assert!(store.active_conversation().unwrap().typing.is_none());
    }

    #[test]
    fn test_search_term_does_not_touch_conversations() {
        let mut store = store();
        let before = format!("{:?}", store.conversations());
        store.search_conversations("cla");
        assert_eq!(store.search_term(), "cla");
        assert_eq!(format!("{:?}", store.conversations()), before);
    }
}
