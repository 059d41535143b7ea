//! Bot handlers module
//!
//! Telegram command handlers for entrants and organizers, plus the text
//! shown to users for each failure.

pub mod commands;
pub mod replies;

// Re-export commonly used handler functions
pub use commands::{handle_command, Command};
pub use replies::describe_error;
