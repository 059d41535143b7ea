//! Help command handler

use teloxide::{Bot, types::Message, prelude::*};
use crate::utils::errors::Result;

/// Handle /help command
pub async fn handle_help(bot: Bot, msg: Message) -> Result<()> {
    let help_text = "🎟 PickMe Help\n\n\
        Entrants:\n\
        /join <event> [lat lon] - Join the waiting list\n\
        /leave <event> - Leave the waiting list\n\
        /accept <event> - Accept your invitation\n\
        /decline <event> - Decline your invitation\n\
        /status <event> - Show waiting-list counts\n\n\
        Organizers:\n\
        /preview <event> - Show how many entrants the next draw picks\n\
        /draw <event> - Run the lottery\n\
        /cancelpending <event> - Cancel unanswered invitations\n\
        /cancelrejected <event> - Cancel declined invitations";

    bot.send_message(msg.chat.id, help_text).await?;
    Ok(())
}
