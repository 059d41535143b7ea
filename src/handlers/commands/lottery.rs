//! Organizer command handlers: draw, preview, cleanup and counts

use teloxide::{Bot, types::Message, prelude::*};
use tracing::{info, warn};
use crate::handlers::commands::sender_id;
use crate::handlers::replies::{describe_error, format_counts, format_preview, format_run};
use crate::services::ServiceFactory;
use crate::utils::errors::{PickMeError, Result};

/// Handle /draw command
pub async fn handle_draw(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(caller_id) = sender_id(&msg) else {
        return Ok(());
    };
    info!(event_id = event_id, caller_id = caller_id, "Lottery draw requested");

    let text = match services.lottery.run_lottery(event_id, caller_id).await {
        Ok(run) => format_run(&run),
        Err(e) => failure_text(PickMeError::Lottery(e)),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /preview command
pub async fn handle_preview(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(caller_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match services.lottery.preview(event_id, caller_id).await {
        Ok(preview) => format_preview(event_id, &preview),
        Err(e) => failure_text(PickMeError::Lottery(e)),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /status command
pub async fn handle_status(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let text = match services.waiting_list.status_counts(event_id).await {
        Ok(counts) => format!("📊 Event {}\n{}", event_id, format_counts(&counts)),
        Err(e) => failure_text(e),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /cancelpending command
pub async fn handle_cancel_pending(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(caller_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match services.waiting_list.cancel_pending(event_id, caller_id).await {
        Ok(cancelled) => format!("🗑 Cancelled {} unanswered invitations for event {}.", cancelled.len(), event_id),
        Err(e) => failure_text(e),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /cancelrejected command
pub async fn handle_cancel_rejected(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(caller_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = match services.waiting_list.cancel_rejected(event_id, caller_id).await {
        Ok(cancelled) => format!("🗑 Cancelled {} declined invitations for event {}.", cancelled.len(), event_id),
        Err(e) => failure_text(e),
    };
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

pub(crate) fn failure_text(err: PickMeError) -> String {
    warn!(error = %err, severity = %err.severity(), "Command failed");
    describe_error(&err)
}
