// File: src/messaging/core/ids.rs

//! Identifier types for the messaging store.
//!
//! Identifiers arrive from fixtures or from a UI layer as plain strings
//! (`"1"`, `"conv_1"`, `"msg_3f2a..."`), so every id is a validated string
//! newtype rather than a raw UUID. Validation is shared by all id kinds.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Errors returned when parsing/validating an identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdError {
    /// Empty (or whitespace-only) identifier.
    Empty,
    /// Exceeds the maximum accepted length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        got: usize,
    },
    /// Contains a disallowed character.
    InvalidChar {
        /// The invalid character.
        ch: char,
        /// The index where it was found.
        index: usize,
    },
}

impl fmt::Display for IdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "id must not be empty"),
            Self::TooLong { max, got } => write!(f, "id too long: got {got}, max {max}"),
            Self::InvalidChar { ch, index } => {
                write!(f, "id contains invalid character {ch:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for IdError {}

/// Hard ceiling to prevent pathological payloads.
pub const MAX_ID_LEN: usize = 64;

/// Validate a raw identifier and return its trimmed form.
///
/// Rules:
/// - Non-empty after trimming.
/// - At most [`MAX_ID_LEN`] bytes.
/// - Conservative ASCII set: `[A-Za-z0-9._:-]`.
fn validate_id(raw: &str) -> Result<&str, IdError> {
    let s = raw.trim();

    if s.is_empty() {
        return Err(IdError::Empty);
    }
    if s.len() > MAX_ID_LEN {
        return Err(IdError::TooLong {
            max: MAX_ID_LEN,
            got: s.len(),
        });
    }

    for (i, ch) in s.chars().enumerate() {
        let ok = ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | ':' | '-');
        if !ok {
            return Err(IdError::InvalidChar { ch, index: i });
        }
    }

    Ok(s)
}

/// Declare a string-backed id newtype with a consistent API.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[repr(transparent)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Build a validated identifier.
            ///
            /// # Errors
            /// Returns `IdError` if the input is empty, too long, or contains invalid characters.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, IdError> {
                validate_id(raw.as_ref()).map(|s| Self(s.to_owned()))
            }

            /// Borrow as `&str`.
            #[inline]
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume into `String`.
            #[inline]
            #[must_use]
            pub fn into_string(self) -> String {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.into_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $name {
            type Error = IdError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }
    };
}

define_string_id!(
    /// Identity of a participant (learner, tutor, or guardian).
    ParticipantId
);

define_string_id!(
    /// Identity of a two-party conversation.
    ConversationId
);

define_string_id!(
    /// Identity of a single message.
    MessageId
);

impl ParticipantId {
    /// Id of the signed-in user in the seeded data set.
    pub const SEED_USER: &'static str = "1";

    /// The signed-in user of the seeded data set.
    #[must_use]
    pub fn seed_user() -> Self {
        Self(Self::SEED_USER.to_owned())
    }
}

impl ConversationId {
    /// Fixture-style id for the n-th seeded conversation (`conv_<n>`).
    #[must_use]
    pub fn numbered(n: usize) -> Self {
        Self(format!("conv_{n}"))
    }
}

impl MessageId {
    /// Prefix of generated message ids.
    pub const PREFIX: &'static str = "msg_";

    /// Generate a fresh message id (`msg_` followed by 12 hex chars).
    #[must_use]
    pub fn generate() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!("{}{}", Self::PREFIX, &simple[..12]))
    }
}
