//! Admin control
//!
//! Thread-scoped commands run by the admin inside the staff forum. The topic
//! a command is sent in identifies the user it applies to.

use relay_core::{BlockRecord, ChatId, IncomingMessage, OutgoingText, User};
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

const NO_USER_SPECIFIED: &str = "No user specified";
const INVALID_USER: &str = "This user is invalid";
const VERIFY_USAGE: &str = "Usage: /verify <true|false>";

/// Admin service
pub struct AdminService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> AdminService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// `/ban`: pin an announcement and block the topic's user
    ///
    /// Runs under the user's mutex, so no message of theirs is relayed between
    /// the announcement and the stored block.
    #[instrument(skip(self, msg), fields(thread = ?msg.thread_id))]
    pub async fn ban(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(user) = self.topic_user(msg).await? else {
            return Ok(());
        };

        let _guard = self.ctx.cache().lock(user.id).await;

        let staff = self.ctx.staff_chat_id();
        let pinned = self.reply(msg, "This user has been banned").await?;
        self.ctx.gateway().pin_message(staff, pinned).await?;
        self.ctx
            .block_repo()
            .create(&BlockRecord::with_announcement(user.id, pinned))
            .await?;
        self.ctx.cache().set_blocked(user.id, true);

        info!(user_id = %user.id, pinned = %pinned, "User banned by admin");
        Ok(())
    }

    /// `/unban`: remove the block and its announcement
    ///
    /// The attempt counter is reset so the user gets a fresh challenge budget.
    #[instrument(skip(self, msg), fields(thread = ?msg.thread_id))]
    pub async fn unban(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(user) = self.topic_user(msg).await? else {
            return Ok(());
        };
        let _guard = self.ctx.cache().lock(user.id).await;

        let Some(block) = self.ctx.block_repo().find(user.id).await? else {
            self.reply(msg, "This user is not blocked").await?;
            return Ok(());
        };

        if let Some(pinned) = block.pinned_message_id {
            match self
                .ctx
                .gateway()
                .delete_message(self.ctx.staff_chat_id(), pinned)
                .await
            {
                Ok(()) => {}
                Err(err) if err.is_bad_request() => {
                    warn!(pinned = %pinned, error = %err, "Ban announcement already gone");
                }
                Err(err) => return Err(err.into()),
            }
        }

        self.ctx.block_repo().delete(user.id).await?;
        self.ctx.cache().set_blocked(user.id, false);
        self.ctx.cache().reset_attempts(user.id);

        self.reply(msg, "User unbanned").await?;
        info!(user_id = %user.id, "User unbanned by admin");
        Ok(())
    }

    /// `/verify <true|false>`: override the verification flag
    #[instrument(skip(self, msg), fields(thread = ?msg.thread_id))]
    pub async fn verify(&self, msg: &IncomingMessage, args: &[&str]) -> ServiceResult<()> {
        if msg.thread_id.is_none() {
            self.reply(msg, NO_USER_SPECIFIED).await?;
            return Ok(());
        }
        let Some(verified) = parse_flag(args) else {
            self.reply(msg, VERIFY_USAGE).await?;
            return Ok(());
        };
        let Some(user) = self.topic_user(msg).await? else {
            return Ok(());
        };

        self.ctx.cache().set_verified(user.id, verified);
        self.ctx
            .verification_repo()
            .set_verified(user.id, verified)
            .await?;

        let notice = if verified {
            "An administrator has verified you, you can send messages directly"
        } else {
            "An administrator has cleared your verification, please verify again"
        };
        self.ctx
            .gateway()
            .send_text(OutgoingText::new(ChatId::from(user.id), notice))
            .await?;

        info!(user_id = %user.id, verified, "Verification overridden by admin");
        Ok(())
    }

    /// User owning the command's topic; replies and yields `None` otherwise
    async fn topic_user(&self, msg: &IncomingMessage) -> ServiceResult<Option<User>> {
        let Some(topic) = msg.thread_id else {
            self.reply(msg, NO_USER_SPECIFIED).await?;
            return Ok(None);
        };
        let user = self.ctx.user_repo().find_by_topic(topic).await?;
        if user.is_none() {
            self.reply(msg, INVALID_USER).await?;
        }
        Ok(user)
    }

    async fn reply(
        &self,
        msg: &IncomingMessage,
        text: &str,
    ) -> ServiceResult<relay_core::MessageId> {
        let mut reply = OutgoingText::new(msg.chat.id, text).reply_to(msg.message_id);
        reply.thread_id = msg.thread_id;
        Ok(self.ctx.gateway().send_text(reply).await?)
    }
}

/// Exactly one argument, `true` or `false` in any case
fn parse_flag(args: &[&str]) -> Option<bool> {
    match args {
        [arg] => match arg.trim().to_lowercase().as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
