//! Property-based tests for the conversation store
//!
//! Random operation sequences must never break ordering, ownership, or the
//! monotonic status lifecycle.

use std::collections::HashMap;

use chrono::{Duration, Utc};
use proptest::prelude::*;

use super::*;
use crate::messaging::core::{
    ContentKind, Conversation, ConversationId, Message, MessageId, MessageStatus, Participant,
    ParticipantId, ParticipantRole,
};

// ============================================================================
// Test Helpers
// ============================================================================

fn pid(id: &str) -> ParticipantId {
    ParticipantId::new(id).unwrap()
}

fn participant(id: &str) -> Participant {
    Participant::new(pid(id), id, "", ParticipantRole::Tutor)
}

fn seeded_store() -> ConversationStore {
    let now = Utc::now();
    let mut conversations = Vec::new();
    for (n, other) in ["u2", "u3"].into_iter().enumerate() {
        let id = ConversationId::numbered(n + 1);
        let messages = (0..4)
            .map(|i| {
                let sender = if i % 2 == 0 { other } else { "u1" };
                Message::new(
                    MessageId::new(format!("seed_{n}_{i}")).unwrap(),
                    id.clone(),
                    pid(sender),
                    "seed",
                    ContentKind::Text,
                    now - Duration::minutes(60 - i64::from(i)),
                )
            })
            .collect();
        conversations.push(
            Conversation::new(id, participant("u1"), participant(other))
                .unwrap()
                .with_messages(messages)
                .unwrap(),
        );
    }
    ConversationStore::new(pid("u1"), conversations).unwrap()
}

fn known_ids(store: &ConversationStore) -> Vec<MessageId> {
    store
        .conversations()
        .iter()
        .flat_map(|c| c.messages().iter().map(|m| m.id.clone()))
        .collect()
}

// ============================================================================
// Arbitrary Generators
// ============================================================================

#[derive(Clone, Debug)]
enum Op {
    Select(usize),
    Send(String),
    MarkRead(Vec<usize>),
    Delete(usize),
    React(usize),
    Delivered(usize),
    Read(usize),
    Typing(bool),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0usize..4).prop_map(Op::Select),
        "[a-z ]{0,8}".prop_map(Op::Send),
        prop::collection::vec(0usize..16, 0..4).prop_map(Op::MarkRead),
        (0usize..16).prop_map(Op::Delete),
        (0usize..16).prop_map(Op::React),
        (0usize..16).prop_map(Op::Delivered),
        (0usize..16).prop_map(Op::Read),
        any::<bool>().prop_map(Op::Typing),
    ]
}

/// Index into the known ids; out-of-range picks an id that never existed.
fn pick(ids: &[MessageId], index: usize) -> MessageId {
    ids.get(index)
        .cloned()
        .unwrap_or_else(|| MessageId::new(format!("ghost_{index}")).unwrap())
}

fn apply(store: &mut ConversationStore, op: &Op) {
    let ids = known_ids(store);
    match op {
        Op::Select(n) => {
            store.select_conversation(&ConversationId::numbered(*n));
        }
        Op::Send(content) => {
            let _ = store.send_message(content, ContentKind::Text);
        }
        Op::MarkRead(indexes) => {
            let targets: Vec<_> = indexes.iter().map(|i| pick(&ids, *i)).collect();
            store.mark_read(&targets);
        }
        Op::Delete(i) => {
            store.delete_message(&pick(&ids, *i));
        }
        Op::React(i) => {
            store.add_reaction(&pick(&ids, *i), "👍");
        }
        Op::Delivered(i) => {
            store.on_delivered(&pick(&ids, *i));
        }
        Op::Read(i) => {
            store.on_read(&pick(&ids, *i));
        }
        Op::Typing(on) => {
            store.set_typing(*on);
        }
    }
}

fn statuses(store: &ConversationStore) -> HashMap<MessageId, MessageStatus> {
    store
        .conversations()
        .iter()
        .flat_map(|c| c.messages().iter().map(|m| (m.id.clone(), m.status())))
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    #[test]
    fn prop_invariants_hold_under_any_sequence(ops in prop::collection::vec(arb_op(), 1..40)) {
        let mut store = seeded_store();

        for op in &ops {
            let before = statuses(&store);
            apply(&mut store, op);
            let after = statuses(&store);

            for conversation in store.conversations() {
                let messages = conversation.messages();
                prop_assert!(messages.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
                prop_assert!(messages.iter().all(|m| m.conversation_id == conversation.id));
                prop_assert!(messages.iter().all(|m| conversation.has_participant(&m.sender_id)));
                prop_assert!(messages.iter().all(|m| m.is_read() == (m.status() == MessageStatus::Read)));
            }

            for (id, status) in &after {
                if let Some(previous) = before.get(id) {
                    prop_assert!(status >= previous, "{id} regressed from {previous} to {status}");
                }
            }
        }
    }

    #[test]
    fn prop_delete_twice_equals_once(index in 0usize..8) {
        let mut once = seeded_store();
        let mut twice = seeded_store();
        let target = pick(&known_ids(&once), index);

        once.delete_message(&target);
        twice.delete_message(&target);
        twice.delete_message(&target);

        prop_assert_eq!(known_ids(&once), known_ids(&twice));
        prop_assert_eq!(known_ids(&once).len(), 7);
        prop_assert!(once.message(&target).is_none());
    }

    #[test]
    fn prop_unknown_select_is_noop(n in 3usize..100) {
        let mut store = seeded_store();
        store.select_conversation(&ConversationId::numbered(1));
        let before = format!("{store:?}");
        store.select_conversation(&ConversationId::numbered(n));
        prop_assert_eq!(format!("{store:?}"), before);
    }
}
