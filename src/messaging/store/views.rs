//! Derived, serializable views handed to rendering code.
//!
//! Views are recomputed from the store on demand and never cached, so they
//! cannot drift from the underlying state.

use std::fmt;

use chrono::{DateTime, Datelike, Timelike, Utc, Weekday};
use serde::Serialize;

use crate::messaging::core::ids::{ConversationId, MessageId, ParticipantId};
use crate::messaging::core::kinds::{ContentKind, MessageStatus, ParticipantRole};
use crate::messaging::core::model::{Conversation, Message, Participant, Reaction, TypingMarker};
use crate::messaging::store::conversation_store::ConversationStore;

/// Resolve the counterpart of `current_user` in a conversation.
///
/// This is the only place views look up "the other participant".
#[must_use]
pub fn other_participant<'a>(
    conversation: &'a Conversation,
    current_user: &ParticipantId,
) -> Option<&'a Participant> {
    conversation.other_participant(current_user)
}

/// Whether the counterpart's name matches a search term.
///
/// Case-insensitive substring match; an empty term matches everything.
#[must_use]
pub fn matches_search(conversation: &Conversation, current_user: &ParticipantId, term: &str) -> bool {
    if term.is_empty() {
        return true;
    }
    let needle = term.to_lowercase();
    other_participant(conversation, current_user)
        .is_some_and(|p| p.name.to_lowercase().contains(&needle))
}

/// Participant fields shown in the conversation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ParticipantSummary {
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
    /// Last time seen online.
    pub last_seen: Option<DateTime<Utc>>,
}

impl From<&Participant> for ParticipantSummary {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            avatar: p.avatar.clone(),
            role: p.role,
            online: p.online,
            last_seen: p.last_seen,
        }
    }
}

/// Preview of the most recent message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LastMessagePreview {
    /// Message content.
    pub content: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Author.
    pub sender_id: ParticipantId,
    /// Read flag.
    pub read: bool,
}

impl From<&Message> for LastMessagePreview {
    fn from(m: &Message) -> Self {
        Self {
            content: m.content.clone(),
            timestamp: m.timestamp,
            sender_id: m.sender_id.clone(),
            read: m.is_read(),
        }
    }
}

/// One row of the conversation list.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConversationListItem {
    /// Conversation identifier.
    pub conversation_id: ConversationId,
    /// The counterpart of the current user.
    pub other_participant: ParticipantSummary,
    /// Most recent message, if any.
    pub last_message: Option<LastMessagePreview>,
    /// Incoming messages not read yet.
    pub unread_count: usize,
    /// Counterpart's typing marker, if set.
    pub typing_indicator: Option<TypingMarker>,
    /// Whether this is the active conversation.
    pub is_active: bool,
}

/// One message of the active thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ThreadMessage {
    /// Message identifier.
    pub id: MessageId,
    /// Author.
    pub sender_id: ParticipantId,
    /// Content.
    pub content: String,
    /// Kind of content.
    pub kind: ContentKind,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Delivery status.
    pub status: MessageStatus,
    /// Read flag, always equal to `status == read`.
    pub read: bool,
    /// Reactions in insertion order.
    pub reactions: Vec<Reaction>,
}

impl From<&Message> for ThreadMessage {
    fn from(m: &Message) -> Self {
        Self {
            id: m.id.clone(),
            sender_id: m.sender_id.clone(),
            content: m.content.clone(),
            kind: m.kind,
            timestamp: m.timestamp,
            status: m.status(),
            read: m.is_read(),
            reactions: m.reactions.clone(),
        }
    }
}

impl ConversationStore {
    /// Conversation list filtered by the current search term.
    #[must_use]
    pub fn conversation_list(&self) -> Vec<ConversationListItem> {
        let me = self.current_user();
        let term = self.search_term();

        self.conversations()
            .iter()
            .filter(|c| matches_search(c, me, term))
            .filter_map(|c| {
                let other = other_participant(c, me)?;
                Some(ConversationListItem {
                    conversation_id: c.id.clone(),
                    other_participant: other.into(),
                    last_message: c.last_message().map(LastMessagePreview::from),
                    unread_count: c.unread_count(me),
                    typing_indicator: c.typing.clone().filter(|t| &t.participant_id != me),
                    is_active: self.active_id() == Some(&c.id),
                })
            })
            .collect()
    }

    /// Messages of the active conversation, oldest first.
    #[must_use]
    pub fn active_thread(&self) -> Vec<ThreadMessage> {
        self.active_conversation()
            .map(|c| c.messages().iter().map(ThreadMessage::from).collect())
            .unwrap_or_default()
    }
}

/// Compact time label for conversation and message lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimeLabel {
    /// Same day: wall-clock time.
    Clock {
        /// Hour (0-23).
        hour: u32,
        /// Minute (0-59).
        minute: u32,
    },
    /// One day ago.
    Yesterday,
    /// Within the last week.
    Weekday(Weekday),
    /// Older: day and month.
    Date {
        /// Day of month (1-31).
        day: u32,
        /// Month (1-12).
        month: u32,
    },
}

impl TimeLabel {
    /// Pick the label for `timestamp` as seen at `now` (whole elapsed days).
    #[must_use]
    pub fn for_timestamp(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        match (now - timestamp).num_days() {
            days if days <= 0 => Self::Clock {
                hour: timestamp.hour(),
                minute: timestamp.minute(),
            },
            1 => Self::Yesterday,
            2..=6 => Self::Weekday(timestamp.weekday()),
            _ => Self::Date {
                day: timestamp.day(),
                month: timestamp.month(),
            },
        }
    }
}

const WEEKDAYS_FR: [&str; 7] = [
    "lundi", "mardi", "mercredi", "jeudi", "vendredi", "samedi", "dimanche",
];

const MONTHS_FR: [&str; 12] = [
    "janv.", "févr.", "mars", "avr.", "mai", "juin", "juil.", "août", "sept.", "oct.", "nov.",
    "déc.",
];

impl fmt::Display for TimeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clock { hour, minute } => write!(f, "{hour:02}:{minute:02}"),
            Self::Yesterday => f.write_str("Hier"),
            Self::Weekday(day) => {
                f.write_str(WEEKDAYS_FR[day.num_days_from_monday() as usize])
            }
            Self::Date { day, month } => {
                let name = MONTHS_FR
                    .get((*month as usize).saturating_sub(1))
                    .copied()
                    .unwrap_or("?");
                write!(f, "{day:02} {name}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn pid(id: &str) -> ParticipantId {
        ParticipantId::new(id).unwrap()
    }

    fn conversation(id: &str, other: &str, name: &str) -> Conversation {
        Conversation::new(
            ConversationId::new(id).unwrap(),
            Participant::new(pid("1"), "Mathieu Randria", "", ParticipantRole::Tutor),
            Participant::new(pid(other), name, "", ParticipantRole::Learner),
        )
        .unwrap()
    }

    fn message(id: &str, conv: &str, sender: &str, at: DateTime<Utc>) -> Message {
        Message::new(
            MessageId::new(id).unwrap(),
            ConversationId::new(conv).unwrap(),
            pid(sender),
            format!("content of {id}"),
            ContentKind::Text,
            at,
        )
    }

    fn store() -> ConversationStore {
        let now = Utc::now();
        let conv_1 = conversation("conv_1", "2", "Clara Rabe")
            .with_messages(vec![
                message("m1", "conv_1", "2", now - Duration::minutes(3)),
                message("m2", "conv_1", "1", now - Duration::minutes(2)),
                message("m3", "conv_1", "2", now - Duration::minutes(1)),
            ])
            .unwrap();
        let conv_2 = conversation("conv_2", "3", "Thomas Razafindrakoto");
        ConversationStore::new(pid("1"), vec![conv_1, conv_2]).unwrap()
    }

    #[test]
    fn test_list_items() {
        let store = store();
        let list = store.conversation_list();
        assert_eq!(list.len(), 2);

        let first = &list[0];
        assert_eq!(first.other_participant.name, "Clara Rabe");
        assert_eq!(first.unread_count, 2);
        let last = first.last_message.as_ref().unwrap();
        assert_eq!(last.content, "content of m3");
        assert!(!last.read);
        assert!(!first.is_active);

        assert!(list[1].last_message.is_none());
        assert_eq!(list[1].unread_count, 0);
    }

    #[test]
    fn test_search_filters_by_other_participant_name() {
        let mut store = store();
        store.search_conversations("CLARA");
        let list = store.conversation_list();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].conversation_id.as_str(), "conv_1");

        // the current user's own name never matches
        store.search_conversations("mathieu");
        assert!(store.conversation_list().is_empty());

        store.search_conversations("");
        assert_eq!(store.conversation_list().len(), 2);
    }

    #[test]
    fn test_typing_indicator_hides_own_marker() {
        let mut store = store();
        let conv_1 = ConversationId::new("conv_1").unwrap();
        store.select_conversation(&conv_1);
        store.set_typing(true);
        assert!(store.conversation_list()[0].typing_indicator.is_none());
        assert!(store.conversation_list()[0].is_active);
    }

    #[test]
    fn test_active_thread() {
        let mut store = store();
        assert!(store.active_thread().is_empty());

        store.select_conversation(&ConversationId::new("conv_1").unwrap());
        let thread = store.active_thread();
        let ids: Vec<_> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["m1", "m2", "m3"]);
        assert!(thread.iter().all(|m| m.read == (m.status == MessageStatus::Read)));
        assert!(thread[0].read);
        assert!(!thread[1].read);
    }

    #[test]
    fn test_thread_serializes_read_flag() {
        let mut store = store();
        store.select_conversation(&ConversationId::new("conv_1").unwrap());
        let json = serde_json::to_value(store.active_thread()).unwrap();
        assert_eq!(json[0]["status"], "read");
        assert_eq!(json[0]["read"], true);
        assert_eq!(json[0]["kind"], "text");
    }

    #[test]
    fn test_time_labels() {
        let now = Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap();

        let same_day = Utc.with_ymd_and_hms(2024, 3, 15, 9, 5, 0).unwrap();
        assert_eq!(TimeLabel::for_timestamp(same_day, now).to_string(), "09:05");

        let yesterday = now - Duration::hours(30);
        assert_eq!(TimeLabel::for_timestamp(yesterday, now), TimeLabel::Yesterday);
        assert_eq!(TimeLabel::Yesterday.to_string(), "Hier");

        // 2024-03-11 was a Monday
        let monday = Utc.with_ymd_and_hms(2024, 3, 11, 12, 0, 0).unwrap();
        assert_eq!(TimeLabel::for_timestamp(monday, now).to_string(), "lundi");

        let older = Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap();
        assert_eq!(TimeLabel::for_timestamp(older, now).to_string(), "01 févr.");
    }
}
