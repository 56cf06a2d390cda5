//! Enumerations shared by the messaging model.
//!
//! All enums use stable `snake_case` identifiers for serialization so a UI
//! bridge can match on them directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Role of a participant on the platform.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantRole {
    /// A student taking lessons.
    Learner,
    /// A tutor giving lessons.
    Tutor,
    /// A parent or guardian following a learner.
    Guardian,
}

impl ParticipantRole {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Learner => "learner",
            Self::Tutor => "tutor",
            Self::Guardian => "guardian",
        }
    }
}

impl fmt::Display for ParticipantRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ParticipantRole {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "learner" | "student" => Ok(Self::Learner),
            "tutor" => Ok(Self::Tutor),
            "guardian" | "parent" => Ok(Self::Guardian),
            _ => Err(value.to_string()),
        }
    }
}

/// Kind of content carried by a message.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// Plain text.
    #[default]
    Text,
    /// A single emoji or emoji-only message.
    Emoji,
    /// An image reference (URL).
    Image,
}

impl ContentKind {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Emoji => "emoji",
            Self::Image => "image",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "text" => Ok(Self::Text),
            "emoji" => Ok(Self::Emoji),
            "image" => Ok(Self::Image),
            _ => Err(value.to_string()),
        }
    }
}

/// Delivery lifecycle of a message: `sent -> delivered -> read`.
///
/// Variants are declared in lifecycle order so the derived `Ord` is the
/// progression order.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageStatus {
    /// Accepted locally, not yet acknowledged.
    Sent,
    /// Acknowledged by the recipient's device.
    Delivered,
    /// Seen by the recipient.
    Read,
}

impl MessageStatus {
    /// Stable string form.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }

    /// Whether moving from `self` to `next` is a forward transition.
    #[must_use]
    pub fn can_advance_to(self, next: Self) -> bool {
        next > self
    }

    /// Whether this status is terminal.
    #[must_use]
    pub const fn is_read(self) -> bool {
        matches!(self, Self::Read)
    }
}

impl fmt::Display for MessageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "sent" => Ok(Self::Sent),
            "delivered" => Ok(Self::Delivered),
            "read" => Ok(Self::Read),
            _ => Err(value.to_string()),
        }
    }
}
