//! `/help` text and the command menu

use relay_core::{BotCommand, IncomingMessage, OutgoingText};
use tracing::info;

use super::context::ServiceContext;
use super::error::ServiceResult;

pub const HELP_TEXT: &str = "\
/start - Start verification (no answer once verified)
/help - Show this message
/d - Delete a message (reply to it)
/ban - Ban the user (admin only)
/unban - Unban the user (admin only)
/info - User, message or bot details (admin only)
/verify - Override verification (admin only)
Send the code - Verify
Send a message - It is delivered to the owner";

pub const BOT_COMMANDS: &[BotCommand] = &[
    BotCommand { command: "start", description: "Start chatting" },
    BotCommand { command: "help", description: "Show help" },
    BotCommand { command: "d", description: "Delete a message" },
    BotCommand { command: "ban", description: "Ban the user" },
    BotCommand { command: "unban", description: "Unban the user" },
    BotCommand { command: "info", description: "User, message or bot details" },
    BotCommand { command: "verify", description: "Verify the user manually" },
];

pub async fn send_help(ctx: &ServiceContext, msg: &IncomingMessage) -> ServiceResult<()> {
    let mut reply = OutgoingText::new(msg.chat.id, HELP_TEXT).reply_to(msg.message_id);
    reply.thread_id = msg.thread_id;
    ctx.gateway().send_text(reply).await?;
    Ok(())
}

/// Publish the command menu
pub async fn register_commands(ctx: &ServiceContext) -> ServiceResult<()> {
    ctx.gateway().set_my_commands(BOT_COMMANDS).await?;
    info!(count = BOT_COMMANDS.len(), "Commands registered");
    Ok(())
}
