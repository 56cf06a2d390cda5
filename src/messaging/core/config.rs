//! Configuration for the messaging subsystem.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::ids::ParticipantId;

/// Prefix of every environment override.
pub const ENV_PREFIX: &str = "TUTOR_MESSAGING_";

/// Top-level configuration for the messaging store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MessagingConfig {
    /// Identity of the signed-in user; owns every sent message.
    pub current_user: ParticipantId,
    /// Simulated acknowledgement delays.
    pub delivery: DeliveryConfig,
    /// Typing indicator settings.
    pub typing: TypingConfig,
    /// Seed data generation.
    pub fixtures: FixtureConfig,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self {
            current_user: ParticipantId::seed_user(),
            delivery: DeliveryConfig::default(),
            typing: TypingConfig::default(),
            fixtures: FixtureConfig::default(),
        }
    }
}

impl MessagingConfig {
    /// Build the default configuration, then apply `TUTOR_MESSAGING_*`
    /// environment overrides and validate.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if a variable cannot be parsed or the result
    /// fails validation.
    pub fn from_env() -> MessagingResult<Self> {
        let mut config = Self::default();

        if let Some(raw) = read_var("CURRENT_USER") {
            config.current_user = ParticipantId::new(&raw)?;
        }
        if let Some(ms) = parse_var::<u64>("DELIVERED_AFTER_MS")? {
            config.delivery.delivered_after_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>("READ_AFTER_MS")? {
            config.delivery.read_after_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>("TYPING_IDLE_MS")? {
            config.typing.idle_timeout_ms = ms;
        }
        if let Some(seed) = parse_var::<u64>("FIXTURE_SEED")? {
            config.fixtures.seed = Some(seed);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration invariants.
    ///
    /// # Errors
    /// Returns an error if any values are out of range.
    pub fn validate(&self) -> MessagingResult<()> {
        if self.delivery.delivered_after_ms == 0 {
            return Err(MessagingError::InvalidConfig(
                "delivery.delivered_after_ms must be > 0".to_string(),
            ));
        }

        if self.delivery.read_after_ms < self.delivery.delivered_after_ms {
            return Err(MessagingError::InvalidConfig(
                "delivery.read_after_ms must be >= delivery.delivered_after_ms".to_string(),
            ));
        }

        if self.typing.idle_timeout_ms == 0 {
            return Err(MessagingError::InvalidConfig(
                "typing.idle_timeout_ms must be > 0".to_string(),
            ));
        }

        if self.fixtures.min_messages == 0 {
            return Err(MessagingError::InvalidConfig(
                "fixtures.min_messages must be > 0".to_string(),
            ));
        }

        if self.fixtures.max_messages < self.fixtures.min_messages {
            return Err(MessagingError::InvalidConfig(format!(
                "fixtures.max_messages ({}) must be >= fixtures.min_messages ({})",
                self.fixtures.max_messages, self.fixtures.min_messages
            )));
        }

        if self.fixtures.history_days == 0 {
            return Err(MessagingError::InvalidConfig(
                "fixtures.history_days must be > 0".to_string(),
            ));
        }

        Ok(())
    }
}

fn read_var(name: &str) -> Option<String> {
    env::var(format!("{ENV_PREFIX}{name}"))
        .ok()
        .filter(|v| !v.trim().is_empty())
}

fn parse_var<T: FromStr>(name: &str) -> MessagingResult<Option<T>>
where
    T::Err: std::fmt::Display,
{
    read_var(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| {
                MessagingError::InvalidConfig(format!("{ENV_PREFIX}{name}={raw:?}: {e}"))
            })
        })
        .transpose()
}

/// Delays used by the simulated acknowledgement transport.
///
/// Both delays are measured from the moment the message was sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Delay before a sent message becomes delivered.
    pub delivered_after_ms: u64,
    /// Delay before a sent message becomes read.
    pub read_after_ms: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            delivered_after_ms: 1000,
            read_after_ms: 3000,
        }
    }
}

impl DeliveryConfig {
    /// Delivery delay as a `Duration`.
    #[must_use]
    pub const fn delivered_after(&self) -> Duration {
        Duration::from_millis(self.delivered_after_ms)
    }

    /// Read delay as a `Duration`.
    #[must_use]
    pub const fn read_after(&self) -> Duration {
        Duration::from_millis(self.read_after_ms)
    }
}

/// Typing indicator settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypingConfig {
    /// Idle time after which the local typing marker is cleared.
    pub idle_timeout_ms: u64,
}

impl Default for TypingConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: 2000,
        }
    }
}

impl TypingConfig {
    /// Idle timeout as a `Duration`.
    #[must_use]
    pub const fn idle_timeout(&self) -> Duration {
        Duration::from_millis(self.idle_timeout_ms)
    }
}

/// Seed data generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureConfig {
    /// RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// Minimum seeded messages per conversation.
    pub min_messages: usize,
    /// Maximum seeded messages per conversation (inclusive).
    pub max_messages: usize,
    /// History window of the first conversation, in days.
    pub history_days: u32,
}

impl Default for FixtureConfig {
    fn default() -> Self {
        Self {
            seed: None,
            min_messages: 10,
            max_messages: 30,
            history_days: 7,
        }
    }
}

/// Builder for messaging configuration.
#[derive(Debug, Clone, Default)]
pub struct MessagingConfigBuilder {
    current_user: Option<ParticipantId>,
    delivered_after_ms: Option<u64>,
    read_after_ms: Option<u64>,
    typing_idle_ms: Option<u64>,
    seed: Option<u64>,
}

impl MessagingConfigBuilder {
    /// Create a new builder with defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the signed-in user.
    #[must_use]
    pub fn current_user(mut self, id: ParticipantId) -> Self {
        self.current_user = Some(id);
        self
    }

    /// Set both acknowledgement delays, in milliseconds.
    #[must_use]
    pub const fn delivery_ms(mut self, delivered_after: u64, read_after: u64) -> Self {
        self.delivered_after_ms = Some(delivered_after);
        self.read_after_ms = Some(read_after);
        self
    }

    /// Set the typing idle timeout, in milliseconds.
    #[must_use]
    pub const fn typing_idle_ms(mut self, ms: u64) -> Self {
        self.typing_idle_ms = Some(ms);
        self
    }

    /// Set the fixture RNG seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build and validate the configuration.
    ///
    /// # Errors
    /// Returns `InvalidConfig` if the resulting values are out of range.
    pub fn build(self) -> MessagingResult<MessagingConfig> {
        let default = MessagingConfig::default();
        let config = MessagingConfig {
            current_user: self.current_user.unwrap_or(default.current_user),
            delivery: DeliveryConfig {
                delivered_after_ms: self
                    .delivered_after_ms
                    .unwrap_or(default.delivery.delivered_after_ms),
                read_after_ms: self.read_after_ms.unwrap_or(default.delivery.read_after_ms),
            },
            typing: TypingConfig {
                idle_timeout_ms: self.typing_idle_ms.unwrap_or(default.typing.idle_timeout_ms),
            },
            fixtures: FixtureConfig {
                seed: self.seed.or(default.fixtures.seed),
                ..default.fixtures
            },
        };
        config.validate()?;
        Ok(config)
    }
}
