//! Relay engine
//!
//! Moves messages between private chats and the per-user forum topics of the
//! staff group and keeps the message-id mapping that edits, reactions and
//! deletions are resolved through.

use relay_cache::UserGuard;
use relay_core::{
    BlockRecord, ChatId, GatewayError, IncomingMessage, MessageId, MessageMapping, OutgoingText,
    ReactionUpdate, TopicId, User, UserId, UserProfile, Verdict,
};
use tracing::{debug, error, info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::moderation::{ModerationService, NON_TEXT_REASON};
use super::verification::{Admission, VerificationService};

const BANNED_NOTICE: &str = "You have been banned";
const FLOOD_BLOCK_NOTICE: &str = "You have been banned, reason: flooding";
const FLOOD_WARNING: &str = "Please stop flooding or you will be banned";
const TIMEOUT_NOTICE: &str = "The bot timed out and your message may not have been delivered.\nYou can send it again or use another way to reach us";
const UNAVAILABLE_NOTICE: &str = "Bot error, relaying is unavailable right now. Please use another way to reach us";
const RECIPIENT_UNREACHABLE: &str = "Delivery failed, the user has blocked the bot";
const UNKNOWN_TOPIC_OWNER: &str = "No user belongs to this topic";

/// Relay service
pub struct RelayService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> RelayService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    // === Private side ===

    /// `/start` in a private chat
    #[instrument(skip(self, msg))]
    pub async fn start(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(user_id) = msg.sender_id() else {
            return Ok(());
        };
        let guard = self.ctx.cache().lock(user_id).await;
        if self.is_blocked(user_id).await? {
            self.reply(msg, BANNED_NOTICE).await?;
            return Ok(());
        }
        VerificationService::new(self.ctx).start(msg, &guard).await
    }

    /// A private message that is not a command
    ///
    /// Block check, verification, flood control, classification and
    /// forwarding all run under one hold of the sender's mutex.
    #[instrument(skip(self, msg), fields(message_id = %msg.message_id))]
    pub async fn handle_private(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(profile) = msg.from.as_ref() else {
            return Ok(());
        };
        let guard = self.ctx.cache().lock(profile.id).await;

        if self.is_blocked(profile.id).await? {
            self.reply(msg, BANNED_NOTICE).await?;
            return Ok(());
        }

        match VerificationService::new(self.ctx)
            .admit(msg, profile, &guard)
            .await?
        {
            Admission::Verified => self.relay_private_to_group(msg, profile, &guard).await,
            Admission::Held => Ok(()),
        }
    }

    async fn relay_private_to_group(
        &self,
        msg: &IncomingMessage,
        profile: &UserProfile,
        guard: &UserGuard,
    ) -> ServiceResult<()> {
        match self.flood_checked_forward(msg, profile, guard).await {
            Err(ServiceError::Gateway(GatewayError::TimedOut)) => {
                warn!(user_id = %profile.id, "Gateway timed out while relaying");
                self.reply(msg, TIMEOUT_NOTICE).await
            }
            other => other,
        }
    }

    async fn flood_checked_forward(
        &self,
        msg: &IncomingMessage,
        profile: &UserProfile,
        guard: &UserGuard,
    ) -> ServiceResult<()> {
        let user_id = profile.id;
        let settings = self.ctx.settings();
        let count = self
            .ctx
            .cache()
            .record_message(user_id, settings.flood_window);

        if count > settings.flood_block_threshold {
            self.ctx
                .block_repo()
                .create(&BlockRecord::automatic(user_id))
                .await?;
            self.ctx.cache().set_blocked(user_id, true);
            warn!(user_id = %user_id, count, "User blocked for flooding");
            self.reply(msg, FLOOD_BLOCK_NOTICE).await?;
            return Ok(());
        }
        if count > settings.flood_warn_threshold {
            debug!(user_id = %user_id, count, "Flood warning");
            self.reply(msg, FLOOD_WARNING).await?;
        }

        let topic = match self.ensure_topic(profile, guard).await {
            Ok(topic) => topic,
            Err(err @ ServiceError::TopicUnavailable(_)) => {
                self.reply(msg, UNAVAILABLE_NOTICE).await?;
                return Err(err);
            }
            Err(err) => return Err(err),
        };

        let verdict = match msg.text.as_deref() {
            Some(text) => {
                ModerationService::new(self.ctx)
                    .check(text, Some(topic))
                    .await?
            }
            None => Verdict::clean(NON_TEXT_REASON),
        };

        let topic_message_id = if verdict.is_spam {
            self.forward_to_spam_topic(msg.chat.id, msg.message_id, &verdict.reason)
                .await?
        } else {
            self.ctx
                .gateway()
                .copy_message(
                    self.ctx.staff_chat_id(),
                    Some(topic),
                    msg.chat.id,
                    msg.message_id,
                )
                .await?
        };

        self.record_mapping(&MessageMapping::new(
            user_id,
            msg.message_id,
            topic_message_id,
            &verdict,
        ))
        .await?;

        debug!(
            user_id = %user_id,
            topic_message_id = %topic_message_id,
            spam = verdict.is_spam,
            "Message relayed"
        );
        Ok(())
    }

    /// Topic of the user, created on first use
    ///
    /// Losing the insert race to a concurrent creator reuses the stored topic.
    #[instrument(skip(self, profile, _guard), fields(user_id = %profile.id))]
    pub async fn ensure_topic(
        &self,
        profile: &UserProfile,
        _guard: &UserGuard,
    ) -> ServiceResult<TopicId> {
        let user_id = profile.id;
        let cache = self.ctx.cache();

        if let Some(topic) = cache.topic_of(user_id) {
            return Ok(topic);
        }
        if let Some(user) = self.ctx.user_repo().find_by_id(user_id).await? {
            self.remember_topic(user_id, user.topic);
            return Ok(user.topic);
        }

        let topic = match self.create_topic(profile).await {
            Ok(topic) => topic,
            Err(err) => {
                self.notify_admin_topic_failure(profile, &err).await;
                return Err(ServiceError::topic_unavailable(err.to_string()));
            }
        };

        let user = User::new(profile, topic);
        match self.ctx.user_repo().create(&user).await {
            Ok(()) => {
                info!(user_id = %user_id, topic = %topic, "Topic created");
            }
            Err(err) if err.is_conflict() => {
                let existing = self
                    .ctx
                    .user_repo()
                    .find_by_id(user_id)
                    .await?
                    .ok_or(ServiceError::Domain(err))?;
                warn!(user_id = %user_id, topic = %existing.topic, "User row already existed");
                self.remember_topic(user_id, existing.topic);
                return Ok(existing.topic);
            }
            Err(err) => return Err(err.into()),
        }

        self.remember_topic(user_id, topic);
        Ok(topic)
    }

    async fn create_topic(&self, profile: &UserProfile) -> Result<TopicId, GatewayError> {
        let staff = self.ctx.staff_chat_id();
        let gateway = self.ctx.gateway();

        let topic = gateway
            .create_forum_topic(staff, &profile.topic_name())
            .await?;
        let intro = format!(
            "User ID {}\nName {}\nPremium: {}",
            profile.id,
            profile.display_name(),
            if profile.is_premium { "yes" } else { "no" },
        );
        gateway
            .send_text(OutgoingText::new(staff, intro).in_thread(topic))
            .await?;
        Ok(topic)
    }

    async fn notify_admin_topic_failure(&self, profile: &UserProfile, err: &GatewayError) {
        error!(user_id = %profile.id, error = %err, "Topic creation failed");
        let text = format!(
            "Failed to create a topic for {} ({}): {err}\nMake sure the bot is an administrator",
            profile.display_name(),
            profile.id,
        );
        let admin_chat = ChatId::from(self.ctx.admin_id());
        if let Err(notify_err) = self
            .ctx
            .gateway()
            .send_text(OutgoingText::new(admin_chat, text))
            .await
        {
            warn!(error = %notify_err, "Could not notify the admin");
        }
    }

    fn remember_topic(&self, user_id: UserId, topic: TopicId) {
        self.ctx.cache().set_topic_of(user_id, topic);
        self.ctx.cache().set_user_of(topic, user_id);
    }

    /// Forward into the spam topic and attach the reason as a reply
    pub async fn forward_to_spam_topic(
        &self,
        from_chat: ChatId,
        message_id: MessageId,
        reason: &str,
    ) -> ServiceResult<MessageId> {
        let staff = self.ctx.staff_chat_id();
        let spam_topic = self.ctx.spam_topic();
        if spam_topic.is_none() {
            warn!("Spam topic not set up, forwarding to the general thread");
        }

        let forwarded = self
            .ctx
            .gateway()
            .forward_message(staff, spam_topic, from_chat, message_id)
            .await?;

        let mut note = OutgoingText::new(staff, reason).reply_to(forwarded);
        note.thread_id = spam_topic;
        self.ctx.gateway().send_text(note).await?;

        Ok(forwarded)
    }

    /// Insert a mapping, treating a lost duplicate race as success
    ///
    /// A conflict with no row under either unique key is a logic defect and
    /// fails with `FatalConsistency`.
    #[instrument(skip(self, mapping), fields(
        user_id = %mapping.user_id,
        private_message_id = %mapping.private_message_id,
        topic_message_id = %mapping.topic_message_id,
    ))]
    pub async fn record_mapping(&self, mapping: &MessageMapping) -> ServiceResult<()> {
        let repo = self.ctx.mapping_repo();
        let err = match repo.insert(mapping).await {
            Ok(()) => return Ok(()),
            Err(err) if err.is_conflict() => err,
            Err(err) => return Err(err.into()),
        };

        if repo
            .find_by_topic_message(mapping.topic_message_id)
            .await?
            .is_some()
        {
            debug!(conflict = %err, "Mapping already stored under the topic message id");
            return Ok(());
        }
        if repo
            .find_by_private(mapping.user_id, mapping.private_message_id)
            .await?
            .is_some()
        {
            debug!(conflict = %err, "Mapping already stored under the private message id");
            return Ok(());
        }

        error!(conflict = %err, "Mapping conflict without a stored row");
        Err(ServiceError::fatal_consistency(format!(
            "insert of mapping {} -> {} conflicted ({err}) but no row exists",
            mapping.private_message_id, mapping.topic_message_id
        )))
    }

    /// Cached block flag, falling back to the repository
    pub async fn is_blocked(&self, user_id: UserId) -> ServiceResult<bool> {
        if let Some(blocked) = self.ctx.cache().is_blocked(user_id) {
            return Ok(blocked);
        }
        let blocked = self.ctx.block_repo().is_blocked(user_id).await?;
        self.ctx.cache().set_blocked(user_id, blocked);
        Ok(blocked)
    }

    // === Staff side ===

    /// Owner of a topic, from the cache or the repository
    pub async fn resolve_topic_owner(&self, topic: TopicId) -> ServiceResult<Option<UserId>> {
        if let Some(user_id) = self.ctx.cache().user_of(topic) {
            return Ok(Some(user_id));
        }
        let Some(user) = self.ctx.user_repo().find_by_topic(topic).await? else {
            return Ok(None);
        };
        self.ctx.cache().set_user_of(topic, user.id);
        Ok(Some(user.id))
    }

    /// A staff message inside a user's topic
    #[instrument(skip(self, msg), fields(message_id = %msg.message_id))]
    pub async fn relay_group_to_private(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(topic) = msg.thread_id else {
            return Ok(());
        };
        let Some(user_id) = self.resolve_topic_owner(topic).await? else {
            self.reply_in_thread(msg, UNKNOWN_TOPIC_OWNER).await?;
            return Ok(());
        };

        let _guard = self.ctx.cache().lock(user_id).await;
        let staff = self.ctx.staff_chat_id();
        let copied = self
            .ctx
            .gateway()
            .copy_message(ChatId::from(user_id), None, staff, msg.message_id)
            .await;

        match copied {
            Ok(private_message_id) => {
                self.record_mapping(&MessageMapping::from_staff(
                    user_id,
                    private_message_id,
                    msg.message_id,
                ))
                .await
            }
            Err(GatewayError::Forbidden(reason)) => {
                warn!(user_id = %user_id, reason = %reason, "Recipient blocked the bot");
                self.ctx
                    .gateway()
                    .send_text(OutgoingText::new(staff, RECIPIENT_UNREACHABLE).in_thread(topic))
                    .await?;
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }

    // === Edits ===

    /// A staff edit is mirrored verbatim
    #[instrument(skip(self, msg), fields(message_id = %msg.message_id))]
    pub async fn edit_from_staff(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(text) = msg.text.as_deref() else {
            return Ok(());
        };
        let Some(mapping) = self
            .ctx
            .mapping_repo()
            .find_by_topic_message(msg.message_id)
            .await?
        else {
            return Ok(());
        };

        self.ctx
            .gateway()
            .edit_message_text(
                ChatId::from(mapping.user_id),
                mapping.private_message_id,
                text,
            )
            .await?;
        Ok(())
    }

    /// A user edit is classified again before it reaches the topic
    ///
    /// Edits that turn into spam go to the spam topic and the topic copy is
    /// left as it was.
    #[instrument(skip(self, msg), fields(message_id = %msg.message_id))]
    pub async fn edit_from_user(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let (Some(text), Some(user_id)) = (msg.text.as_deref(), msg.sender_id()) else {
            return Ok(());
        };
        let Some(mapping) = self
            .ctx
            .mapping_repo()
            .find_by_private(user_id, msg.message_id)
            .await?
        else {
            return Ok(());
        };
        let Some(user) = self.ctx.user_repo().find_by_id(user_id).await? else {
            return Ok(());
        };

        let _guard = self.ctx.cache().lock(user_id).await;
        let verdict = ModerationService::new(self.ctx)
            .check(text, Some(user.topic))
            .await?;

        if verdict.is_spam {
            self.forward_to_spam_topic(msg.chat.id, msg.message_id, &verdict.reason)
                .await?;
            self.reply(msg, format!("Message rejected, reason: {}", verdict.reason))
                .await?;
            info!(user_id = %user_id, reason = %verdict.reason, "Edit rejected as spam");
            return Ok(());
        }

        self.ctx
            .gateway()
            .edit_message_text(self.ctx.staff_chat_id(), mapping.topic_message_id, text)
            .await?;
        Ok(())
    }

    // === Reactions ===

    /// Mirror the first reaction to the counterpart message
    #[instrument(skip(self, update), fields(message_id = %update.message_id))]
    pub async fn mirror_reaction(&self, update: &ReactionUpdate) -> ServiceResult<()> {
        let staff = self.ctx.staff_chat_id();
        let repo = self.ctx.mapping_repo();

        let (target_chat, target_message, warning) = if update.chat.is_private() {
            let user_id = UserId::new(update.chat.id.into_inner());
            let Some(mapping) = repo.find_by_private(user_id, update.message_id).await? else {
                return Ok(());
            };
            (
                staff,
                mapping.topic_message_id,
                "You can react more than once, but staff only sees your first reaction",
            )
        } else if update.chat.id == staff {
            let Some(mapping) = repo.find_by_topic_message(update.message_id).await? else {
                return Ok(());
            };
            (
                ChatId::from(mapping.user_id),
                mapping.private_message_id,
                "You can react more than once, but the user only sees the first reaction",
            )
        } else {
            return Ok(());
        };

        if update.new_reaction.len() > 1 {
            self.ctx
                .gateway()
                .send_text(OutgoingText::new(update.chat.id, warning))
                .await?;
        }

        self.ctx
            .gateway()
            .set_reaction(
                target_chat,
                target_message,
                update.new_reaction.first().cloned(),
            )
            .await?;
        Ok(())
    }

    // === Deletion ===

    /// `/d`: delete both copies of the replied-to message
    ///
    /// The mapping is removed last, so a failed delete leaves it in place.
    #[instrument(skip(self, msg), fields(message_id = %msg.message_id))]
    pub async fn delete_command(&self, msg: &IncomingMessage) -> ServiceResult<()> {
        let Some(target) = msg.reply_target() else {
            self.reply_in_thread(msg, "Please reply to a message").await?;
            return Ok(());
        };
        let repo = self.ctx.mapping_repo();

        let mapping = if msg.chat.is_private() {
            let Some(user_id) = msg.sender_id() else {
                return Ok(());
            };
            repo.find_by_private(user_id, target).await?
        } else if self.ctx.is_staff_forum_admin(msg) {
            repo.find_by_topic_message(target).await?
        } else {
            self.reply_in_thread(msg, "Invalid message target").await?;
            return Ok(());
        };

        let Some(mapping) = mapping else {
            self.reply_in_thread(msg, "The replied message can no longer be deleted")
                .await?;
            return Ok(());
        };

        let gateway = self.ctx.gateway();
        gateway
            .delete_message(ChatId::from(mapping.user_id), mapping.private_message_id)
            .await?;
        gateway
            .delete_message(self.ctx.staff_chat_id(), mapping.topic_message_id)
            .await?;
        repo.delete(&mapping).await?;

        info!(
            user_id = %mapping.user_id,
            topic_message_id = %mapping.topic_message_id,
            "Mapped message deleted"
        );
        Ok(())
    }

    // === Replies ===

    async fn reply(&self, msg: &IncomingMessage, text: impl Into<String>) -> ServiceResult<()> {
        self.ctx
            .gateway()
            .send_text(OutgoingText::new(msg.chat.id, text).reply_to(msg.message_id))
            .await?;
        Ok(())
    }

    async fn reply_in_thread(&self, msg: &IncomingMessage, text: &str) -> ServiceResult<()> {
        let mut reply = OutgoingText::new(msg.chat.id, text).reply_to(msg.message_id);
        reply.thread_id = msg.thread_id;
        self.ctx.gateway().send_text(reply).await?;
        Ok(())
    }
}
