//! `/info` diagnostics
//!
//! The general thread reports on the bot itself, a reply inside a topic on
//! the replied-to message, anything else inside a topic on the topic's user.

use std::fmt::Write as _;
use std::time::Duration;

use relay_core::{IncomingMessage, MessageId, OutgoingText, TopicId};
use tracing::{instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;

/// Info service
pub struct InfoService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> InfoService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    #[instrument(skip(self, msg), fields(thread = ?msg.thread_id))]
    pub async fn route(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let report = match (msg.thread_id, msg.reply_target()) {
            (None, _) => self.bot_report().await?,
            (Some(_), Some(target)) => self.message_report(target).await?,
            (Some(topic), None) => self.user_report(topic).await?,
        };

        let mut reply = OutgoingText::new(msg.chat.id, report).reply_to(msg.message_id);
        reply.thread_id = msg.thread_id;
        self.ctx.gateway().send_text(reply).await?;
        Ok(())
    }

    /// Bot identity, uptime, repository health and counts, cache occupancy
    pub async fn bot_report(&self) -> ServiceResult<String> {
        let me = self.ctx.gateway().get_me().await?;
        let health = self.ctx.health();
        let mut out = String::new();

        let _ = writeln!(out, "Bot:");
        let _ = writeln!(out, "> Name: {}", me.first_name);
        let _ = writeln!(out, "> ID: {}", me.id);
        if let Some(username) = &me.username {
            let _ = writeln!(out, "> Username: @{username}");
        }
        let _ = writeln!(out, "> Uptime: {}", format_uptime(self.ctx.cache().uptime()));
        let _ = writeln!(out, "> Ready: {}", yes_no(self.ctx.is_ready()));

        let _ = writeln!(out, "Database:");
        let _ = writeln!(out, "> Backend: {}", health.backend());
        match health.ping().await {
            Ok(()) => {
                let (verified, blocked, topics, total, spam) = futures::try_join!(
                    self.ctx.verification_repo().count_verified(),
                    self.ctx.block_repo().count(),
                    self.ctx.user_repo().count_topics(),
                    self.ctx.mapping_repo().count_total(),
                    self.ctx.mapping_repo().count_spam(),
                )?;
                let _ = writeln!(out, "> Status: ok");
                let _ = writeln!(out, "> Verified users: {verified}");
                let _ = writeln!(out, "> Blocked users: {blocked}");
                let _ = writeln!(out, "> Topics: {topics}");
                let _ = writeln!(out, "> Stored messages: {total}");
                let _ = writeln!(out, "> Spam messages: {spam}");
            }
            Err(err) => {
                warn!(error = %err, "Repository health check failed");
                let _ = writeln!(out, "> Status: failing ({err})");
            }
        }

        let stats = self.ctx.cache().stats();
        let _ = writeln!(out, "Cache:");
        let _ = writeln!(out, "> User locks: {}", stats.locks);
        let _ = writeln!(out, "> User entries: {}", stats.users);
        let _ = writeln!(out, "> Topic entries: {}", stats.topics);
        let _ = write!(out, "> Flood queues: {}", stats.flood_queues);
        Ok(out)
    }

    /// Mapping of a message in a topic
    pub async fn message_report(&self, topic_message_id: MessageId) -> ServiceResult<String> {
        let Some(mapping) = self
            .ctx
            .mapping_repo()
            .find_by_topic_message(topic_message_id)
            .await?
        else {
            return Ok("This message is invalid or not stored".to_string());
        };

        Ok(format!(
            "Message:\n\
             > Message ID: {}\n\
             > Private message ID: {}\n\
             > Sent at: {}\n\
             > Spam: {}\n\
             > Reason: {}",
            mapping.topic_message_id,
            mapping.private_message_id,
            mapping.created_at.format("%Y-%m-%d %H:%M:%S UTC"),
            yes_no(mapping.spam),
            mapping.reason,
        ))
    }

    /// Profile and state of a topic's user
    pub async fn user_report(&self, topic: TopicId) -> ServiceResult<String> {
        let Some(user) = self.ctx.user_repo().find_by_topic(topic).await? else {
            return Ok("This user is invalid".to_string());
        };
        let (blocked, messages) = futures::try_join!(
            self.ctx.block_repo().is_blocked(user.id),
            self.ctx.mapping_repo().count_by_user(user.id),
        )?;

        Ok(format!(
            "User:\n\
             > User ID: {}\n\
             > Username: {}\n\
             > Language: {}\n\
             > Premium: {}\n\
             > Verified at: {}\n\
             > Blocked: {}\n\
             > Stored messages: {messages}",
            user.id,
            user.mention().unwrap_or_else(|| "none".to_string()),
            user.language_code.as_deref().unwrap_or("unknown"),
            yes_no(user.is_premium),
            user.first_active_time.format("%Y-%m-%d %H:%M:%S UTC"),
            yes_no(blocked),
        ))
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn format_uptime(uptime: Duration) -> String {
    let secs = uptime.as_secs();
    format!(
        "{}d {}h {}m {}s",
        secs / 86_400,
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60
    )
}
