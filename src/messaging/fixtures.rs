//! Seed data standing in for what a backend would return.
//!
//! The signed-in user gets one conversation with each other seeded user.
//! Message history is random but reproducible when a seed is configured.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::messaging::core::config::{FixtureConfig, MessagingConfig};
use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::ids::{ConversationId, MessageId, ParticipantId};
use crate::messaging::core::kinds::{ContentKind, MessageStatus, ParticipantRole};
use crate::messaging::core::model::{Conversation, Message, Participant, Reaction, TypingMarker};
use crate::messaging::store::conversation_store::ConversationStore;

/// First message of every seeded conversation.
pub const GREETING: &str = "Bonjour! 👋";

const TEXTS: &[&str] = &[
    "D'accord, on se retrouve à la prochaine session! 📚",
    "Merci pour ton aide, j'ai beaucoup mieux compris maintenant.",
    "Est-ce qu'on peut revoir ce concept la prochaine fois ?",
    "Voici les exercices que tu m'as demandés 📝",
    "Super progrès! Continue comme ça! 🌟",
    "J'ai une question sur le devoir...",
    "Parfait! À demain alors! 👋",
    "Je serai un peu en retard, désolé(e) 🙏",
    "On peut décaler la session à 15h ?",
    "Excellent travail sur les exercices! 👏",
    "N'oublie pas de réviser pour le test de demain 📖",
    "Voici un résumé de ce qu'on a vu aujourd'hui...",
    "Je comprends mieux maintenant, merci! 🙂",
];

const IMAGES: &[&str] = &[
    "https://images.pexels.com/photos/4492160/pexels-photo-4492160.jpeg?auto=compress&cs=tinysrgb&w=1260&h=750&dpr=2",
];

const REACTION_EMOJIS: &[&str] = &["👍", "❤️", "😊", "👏", "🎉"];

/// Messages older than this are seeded as read, newer ones as delivered.
const READ_AGE: Duration = Duration::hours(1);

struct SeedUser {
    id: &'static str,
    name: &'static str,
    avatar: &'static str,
    role: ParticipantRole,
    offline_for: Option<Duration>,
}

const SEED_USERS: &[SeedUser] = &[
    SeedUser {
        id: ParticipantId::SEED_USER,
        name: "Mathieu Randria",
        avatar: "https://i.pravatar.cc/150?img=12",
        role: ParticipantRole::Tutor,
        offline_for: None,
    },
    SeedUser {
        id: "2",
        name: "Clara Rabe",
        avatar: "https://i.pravatar.cc/150?img=25",
        role: ParticipantRole::Tutor,
        offline_for: Some(Duration::minutes(30)),
    },
    SeedUser {
        id: "3",
        name: "Thomas Razafindrakoto",
        avatar: "https://i.pravatar.cc/150?img=18",
        role: ParticipantRole::Tutor,
        offline_for: None,
    },
    SeedUser {
        id: "4",
        name: "Soa Andriamahefa",
        avatar: "https://i.pravatar.cc/150?img=32",
        role: ParticipantRole::Learner,
        offline_for: None,
    },
    SeedUser {
        id: "5",
        name: "Faniry Andria",
        avatar: "https://i.pravatar.cc/150?img=8",
        role: ParticipantRole::Learner,
        offline_for: Some(Duration::hours(2)),
    },
];

/// The seeded participants, in list order.
///
/// # Errors
/// Returns `InvalidId` if a seeded id fails validation.
pub fn seed_participants(now: DateTime<Utc>) -> MessagingResult<Vec<Participant>> {
    SEED_USERS
        .iter()
        .map(|user| {
            let participant = Participant::new(
                ParticipantId::new(user.id)?,
                user.name,
                user.avatar,
                user.role,
            );
            Ok(match user.offline_for {
                Some(ago) => participant.offline_since(now - ago),
                None => participant,
            })
        })
        .collect()
}

/// Build the RNG for a fixture run.
#[must_use]
pub fn fixture_rng(config: &FixtureConfig) -> StdRng {
    config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

/// Generate a chronological message history for one conversation.
///
/// The first generated message is always [`GREETING`]; timestamps fall
/// uniformly within the last `days` days.
pub fn generate_messages<R: Rng>(
    rng: &mut R,
    conversation_id: &ConversationId,
    participants: &[Participant; 2],
    days: u32,
    config: &FixtureConfig,
    now: DateTime<Utc>,
) -> Vec<Message> {
    let count = rng.gen_range(config.min_messages..=config.max_messages);
    let span_ms = Duration::days(i64::from(days)).num_milliseconds();
    let start = now - Duration::days(i64::from(days));

    let mut messages: Vec<Message> = (0..count)
        .map(|i| {
            let sender = &participants[rng.gen_range(0..participants.len())];
            let timestamp = start + Duration::milliseconds(rng.gen_range(0..=span_ms));
            let (kind, content) = if i == 0 {
                (ContentKind::Text, GREETING)
            } else {
                random_content(rng)
            };
            let status = if now - timestamp > READ_AGE {
                MessageStatus::Read
            } else {
                MessageStatus::Delivered
            };

            let mut message = Message::new(
                MessageId::generate(),
                conversation_id.clone(),
                sender.id.clone(),
                content,
                kind,
                timestamp,
            )
            .with_status(status);

            if rng.gen_bool(0.3) {
                let reactor = &participants[rng.gen_range(0..participants.len())];
                message.reactions.push(Reaction {
                    emoji: pick(rng, REACTION_EMOJIS).to_string(),
                    users: vec![reactor.id.clone()],
                });
            }
            message
        })
        .collect();

    messages.sort_by_key(|m| m.timestamp);
    messages
}

fn random_content<R: Rng>(rng: &mut R) -> (ContentKind, &'static str) {
    if rng.gen_bool(0.1) {
        (ContentKind::Emoji, pick(rng, REACTION_EMOJIS))
    } else if rng.gen_bool(0.1) {
        (ContentKind::Image, pick(rng, IMAGES))
    } else {
        (ContentKind::Text, pick(rng, TEXTS))
    }
}

fn pick<R: Rng>(rng: &mut R, items: &[&'static str]) -> &'static str {
    items.choose(rng).copied().unwrap_or_default()
}

/// Seed one conversation between `me` and every other seeded user.
///
/// Conversation `conv_<n>` spans `history_days - (n - 1)` days of history
/// (at least one).
///
/// # Errors
/// Returns `InvalidConfig` if `me` is not a seeded participant, or another
/// error if a seeded id or conversation fails validation.
pub fn seed_conversations<R: Rng>(
    rng: &mut R,
    me: &ParticipantId,
    config: &FixtureConfig,
    now: DateTime<Utc>,
) -> MessagingResult<Vec<Conversation>> {
    let (mine, others): (Vec<_>, Vec<_>) = seed_participants(now)?
        .into_iter()
        .partition(|p| &p.id == me);
    let Some(local) = mine.into_iter().next() else {
        return Err(MessagingError::InvalidConfig(format!(
            "current user {me} is not a seeded participant"
        )));
    };

    others
        .into_iter()
        .enumerate()
        .map(|(index, other)| {
            let id = ConversationId::numbered(index + 1);
            let days = u32::try_from(index)
                .ok()
                .and_then(|i| config.history_days.checked_sub(i))
                .unwrap_or(0)
                .max(1);
            let conversation = Conversation::new(id.clone(), local.clone(), other.clone())?;
            let messages =
                generate_messages(rng, &id, conversation.participants(), days, config, now);

            let mut conversation = conversation.with_messages(messages)?;
            if rng.gen_bool(0.2) {
                conversation.typing = Some(TypingMarker {
                    participant_id: other.id,
                    timestamp: now,
                });
            }
            Ok(conversation)
        })
        .collect()
}

/// Build a store populated with seed data, viewed by `config.current_user`.
///
/// # Errors
/// Returns an error if the configuration is invalid or seeding fails.
pub fn seed_store(config: &MessagingConfig) -> MessagingResult<ConversationStore> {
    config.validate()?;
    let mut rng = fixture_rng(&config.fixtures);
    let conversations =
        seed_conversations(&mut rng, &config.current_user, &config.fixtures, Utc::now())?;
    let messages: usize = conversations.iter().map(|c| c.messages().len()).sum();
    info!(
        conversations = conversations.len(),
        messages,
        seed = ?config.fixtures.seed,
        "seeded conversation store"
    );
    ConversationStore::new(config.current_user.clone(), conversations)
}
