//! Command handlers module
//!
//! This module contains handlers for all bot commands

pub mod help;
pub mod lottery;
pub mod waiting_list;

use teloxide::{Bot, types::Message, utils::command::BotCommands};
use crate::utils::errors::Result;
use crate::services::ServiceFactory;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "PickMe commands:")]
pub enum Command {
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Join an event's waiting list: /join <event> [lat lon]")]
    Join(String),
    #[command(description = "Leave an event's waiting list")]
    Leave(i64),
    #[command(description = "Accept your invitation")]
    Accept(i64),
    #[command(description = "Decline your invitation")]
    Decline(i64),
    #[command(description = "Show waiting-list counts for an event")]
    Status(i64),
    #[command(description = "Preview the next draw (organizer only)")]
    Preview(i64),
    #[command(description = "Run the lottery (organizer only)")]
    Draw(i64),
    #[command(rename = "cancelpending", description = "Cancel unanswered invitations (organizer only)")]
    CancelPending(i64),
    #[command(rename = "cancelrejected", description = "Cancel declined invitations (organizer only)")]
    CancelRejected(i64),
}

/// Main command dispatcher
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, services: ServiceFactory) -> Result<()> {
    match cmd {
        Command::Help => help::handle_help(bot, msg).await,
        Command::Join(args) => waiting_list::handle_join(bot, msg, services, args).await,
        Command::Leave(event_id) => waiting_list::handle_leave(bot, msg, services, event_id).await,
        Command::Accept(event_id) => waiting_list::handle_accept(bot, msg, services, event_id).await,
        Command::Decline(event_id) => waiting_list::handle_decline(bot, msg, services, event_id).await,
        Command::Status(event_id) => lottery::handle_status(bot, msg, services, event_id).await,
        Command::Preview(event_id) => lottery::handle_preview(bot, msg, services, event_id).await,
        Command::Draw(event_id) => lottery::handle_draw(bot, msg, services, event_id).await,
        Command::CancelPending(event_id) => lottery::handle_cancel_pending(bot, msg, services, event_id).await,
        Command::CancelRejected(event_id) => lottery::handle_cancel_rejected(bot, msg, services, event_id).await,
    }
}

/// Telegram id of the message author; channel posts have none
pub(crate) fn sender_id(msg: &Message) -> Option<i64> {
    msg.from.as_ref().map(|user| user.id.0 as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("/draw 12", "pickme_bot").unwrap(), Command::Draw(12));
        assert_eq!(
            Command::parse("/join 7 53.5 -113.5", "pickme_bot").unwrap(),
            Command::Join("7 53.5 -113.5".to_string())
        );
        assert_eq!(Command::parse("/cancelpending 3", "pickme_bot").unwrap(), Command::CancelPending(3));
        assert!(Command::parse("/draw twelve", "pickme_bot").is_err());
    }
}
