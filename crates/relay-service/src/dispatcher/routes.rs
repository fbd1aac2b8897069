//! Standard route table

use futures::FutureExt;
use relay_core::{ChatKind, IncomingMessage, Update};

use super::{HandlerFuture, Route};
use crate::services::help::send_help;
use crate::services::{AdminService, InfoService, RelayService, ServiceContext};

/// Commands only the admin may run inside the staff forum
const ADMIN_COMMANDS: &[&str] = &["ban", "unban", "info", "verify"];

/// Routes in evaluation order
pub fn default_routes() -> Vec<Route> {
    vec![
        Route::new("start", is_private_start, start),
        Route::new("help", is_help, help),
        Route::new("delete", is_delete, delete),
        Route::new("admin_command", is_admin_command, admin_command),
        Route::new("edit_from_staff", is_staff_edit, edit_from_staff),
        Route::new("edit_from_user", is_private_edit, edit_from_user),
        Route::new("staff_to_private", is_staff_message, staff_to_private),
        Route::new("private_to_staff", is_private_message, private_to_staff),
        Route::new("reaction", is_reaction, reaction),
    ]
}

fn new_message(update: &Update) -> Option<&IncomingMessage> {
    match update {
        Update::Message(msg) => Some(msg),
        _ => None,
    }
}

fn edited_message(update: &Update) -> Option<&IncomingMessage> {
    match update {
        Update::EditedMessage(msg) => Some(msg),
        _ => None,
    }
}

fn command_name(update: &Update) -> Option<&str> {
    new_message(update)?.command().map(|cmd| cmd.name)
}

fn is_private(msg: &IncomingMessage) -> bool {
    msg.chat.kind == ChatKind::Private
}

// === Predicates ===

fn is_private_start(_: &ServiceContext, update: &Update) -> bool {
    new_message(update).is_some_and(is_private) && command_name(update) == Some("start")
}

fn is_help(_: &ServiceContext, update: &Update) -> bool {
    command_name(update) == Some("help")
}

fn is_delete(_: &ServiceContext, update: &Update) -> bool {
    command_name(update) == Some("d")
}

fn is_admin_command(ctx: &ServiceContext, update: &Update) -> bool {
    new_message(update).is_some_and(|msg| ctx.is_staff_forum_admin(msg))
        && command_name(update).is_some_and(|name| ADMIN_COMMANDS.contains(&name))
}

fn is_staff_edit(ctx: &ServiceContext, update: &Update) -> bool {
    edited_message(update).is_some_and(|msg| ctx.is_staff_forum_admin(msg))
}

fn is_private_edit(_: &ServiceContext, update: &Update) -> bool {
    edited_message(update).is_some_and(is_private)
}

fn is_staff_message(ctx: &ServiceContext, update: &Update) -> bool {
    new_message(update).is_some_and(|msg| ctx.is_staff_forum_admin(msg) && !msg.is_command())
}

fn is_private_message(_: &ServiceContext, update: &Update) -> bool {
    new_message(update).is_some_and(|msg| is_private(msg) && !msg.is_command())
}

fn is_reaction(_: &ServiceContext, update: &Update) -> bool {
    matches!(update, Update::Reaction(_))
}

// === Handlers ===

fn start<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match new_message(update) {
            Some(msg) => RelayService::new(ctx).start(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn help<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match new_message(update) {
            Some(msg) => send_help(ctx, msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn delete<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match new_message(update) {
            Some(msg) => RelayService::new(ctx).delete_command(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn admin_command<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        let Some(msg) = new_message(update) else {
            return Ok(());
        };
        let Some(cmd) = msg.command() else {
            return Ok(());
        };
        match cmd.name {
            "ban" => AdminService::new(ctx).ban(msg).await,
            "unban" => AdminService::new(ctx).unban(msg).await,
            "verify" => AdminService::new(ctx).verify(msg, &cmd.args).await,
            "info" => InfoService::new(ctx).route(msg).await,
            _ => Ok(()),
        }
    }
    .boxed()
}

fn edit_from_staff<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match edited_message(update) {
            Some(msg) => RelayService::new(ctx).edit_from_staff(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn edit_from_user<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match edited_message(update) {
            Some(msg) => RelayService::new(ctx).edit_from_user(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn staff_to_private<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match new_message(update) {
            Some(msg) => RelayService::new(ctx).relay_group_to_private(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn private_to_staff<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match new_message(update) {
            Some(msg) => RelayService::new(ctx).handle_private(msg).await,
            None => Ok(()),
        }
    }
    .boxed()
}

fn reaction<'a>(ctx: &'a ServiceContext, update: &'a Update) -> HandlerFuture<'a> {
    async move {
        match update {
            Update::Reaction(reaction) => RelayService::new(ctx).mirror_reaction(reaction).await,
            _ => Ok(()),
        }
    }
    .boxed()
}
