//! Entrant command handlers

use teloxide::{Bot, types::Message, prelude::*};
use crate::handlers::commands::lottery::failure_text;
use crate::handlers::commands::sender_id;
use crate::handlers::replies::parse_join_args;
use crate::models::JoinWaitingListRequest;
use crate::services::ServiceFactory;
use crate::utils::errors::Result;

/// Handle /join command
pub async fn handle_join(bot: Bot, msg: Message, services: ServiceFactory, args: String) -> Result<()> {
    let Some(entrant_id) = sender_id(&msg) else {
        return Ok(());
    };

    let outcome = match parse_join_args(&args) {
        Ok((event_id, geolocation)) => services
            .waiting_list
            .join(JoinWaitingListRequest { event_id, entrant_id, geolocation })
            .await
            .map(|entrant| format!("✅ You joined the waiting list of event {}.", entrant.event_id)),
        Err(e) => Err(e),
    };

    let text = outcome.unwrap_or_else(failure_text);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /leave command
pub async fn handle_leave(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(entrant_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = services
        .waiting_list
        .leave(event_id, entrant_id)
        .await
        .map(|_| format!("👋 You left the waiting list of event {}.", event_id))
        .unwrap_or_else(failure_text);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /accept command
pub async fn handle_accept(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(entrant_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = services
        .waiting_list
        .accept(event_id, entrant_id)
        .await
        .map(|_| format!("🎉 See you at event {}!", event_id))
        .unwrap_or_else(failure_text);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}

/// Handle /decline command
pub async fn handle_decline(bot: Bot, msg: Message, services: ServiceFactory, event_id: i64) -> Result<()> {
    let Some(entrant_id) = sender_id(&msg) else {
        return Ok(());
    };

    let text = services
        .waiting_list
        .decline(event_id, entrant_id)
        .await
        .map(|_| format!("Your spot at event {} has been released.", event_id))
        .unwrap_or_else(failure_text);
    bot.send_message(msg.chat.id, text).await?;
    Ok(())
}
