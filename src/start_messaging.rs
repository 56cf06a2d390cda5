//! Startup helpers for the messaging demo.
//!
//! Seeds fixtures, runs a short scripted session against the simulated
//! transport, and logs what a UI would render.

use std::process::ExitCode;
use std::time::Duration;

use chrono::Utc;

use crate::messaging::core::config::MessagingConfig;
use crate::messaging::core::errors::{MessagingError, MessagingResult};
use crate::messaging::core::kinds::ContentKind;
use crate::messaging::service::MessagingService;
use crate::messaging::store::TimeLabel;

/// Slack added on top of the read delay before checking final statuses.
const SETTLE_MARGIN: Duration = Duration::from_millis(250);

/// Run the demo session (used by the `tutor-messaging` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` when the session completes, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    crate::init_tracing();

    tracing::info!("Starting tutor messaging v{}", env!("CARGO_PKG_VERSION"));

    let config = match MessagingConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!("Invalid configuration: {e}");
            return ExitCode::from(1);
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(run_session(&config)) {
        tracing::error!("Messaging session failed: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Seed a service, open the first conversation, send a greeting, and wait
/// for it to be acknowledged.
///
/// # Errors
/// Returns an error if seeding fails or an operation is rejected.
pub async fn run_session(config: &MessagingConfig) -> MessagingResult<()> {
    let service = MessagingService::bootstrap(config)?;
    let result = scripted_session(&service, config).await;
    service.dispose().await;
    result
}

async fn scripted_session(service: &MessagingService, config: &MessagingConfig) -> MessagingResult<()> {
    let now = Utc::now();
    let list = service.conversation_list().await;
    for item in &list {
        let label = item
            .last_message
            .as_ref()
            .map(|m| TimeLabel::for_timestamp(m.timestamp, now).to_string())
            .unwrap_or_default();
        tracing::info!(
            conversation = %item.conversation_id,
            with = %item.other_participant.name,
            online = item.other_participant.online,
            unread = item.unread_count,
            typing = item.typing_indicator.is_some(),
            %label,
            "conversation"
        );
    }

    let Some(first) = list.first() else {
        tracing::warn!("No conversations seeded");
        return Ok(());
    };

    service.select_conversation(&first.conversation_id).await?;
    service.set_typing(true).await?;
    let id = service.send_message("Bonjour", ContentKind::Text).await?;
    service.set_typing(false).await?;
    service.add_reaction(&id, "👍").await?;

    tokio::time::sleep(config.delivery.read_after() + SETTLE_MARGIN).await;

    let thread = service.active_thread().await;
    let sent = thread
        .iter()
        .find(|m| m.id == id)
        .ok_or_else(|| MessagingError::InvalidConversation(format!("message {id} vanished")))?;
    tracing::info!(message = %sent.id, status = %sent.status, read = sent.read, "greeting acknowledged");

    match serde_json::to_string(&service.conversation_list().await) {
        Ok(json) => tracing::debug!(%json, "conversation list"),
        Err(e) => tracing::warn!("Failed to serialize conversation list: {e}"),
    }
    Ok(())
}
