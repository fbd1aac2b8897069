//! Verification gate
//!
//! `Unverified -> ChallengeIssued -> {Verified | Blocked}`. Every method takes
//! the caller's `UserGuard`, so one user's challenge, answer and attempt
//! count are never processed concurrently.

use relay_cache::UserGuard;
use relay_core::{
    BlockRecord, IncomingMessage, OutgoingText, UserId, UserProfile, VerificationRecord,
};
use tracing::{info, instrument, warn};

use super::context::ServiceContext;
use super::error::{ServiceError, ServiceResult};
use super::relay::RelayService;

/// Wrong answers allowed before the user is blocked
pub const MAX_ATTEMPTS: u32 = 3;

const FIRST_CONTACT_CAPTION: &str =
    "Hello! Before sending messages, please enter the code shown in the image (case-insensitive)";
const RETRY_CAPTION: &str = "Hello! Before your messages can be delivered, please enter the code shown in the image (case-insensitive)";
const EXPIRED_CAPTION: &str = "The code has expired, please enter the new one (case-insensitive)";
const PLEASE_WAIT: &str = "Please wait...";

/// Whether a private message may continue to the relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Verified,
    /// The message was consumed by the challenge flow
    Held,
}

/// State of the stored challenge
enum Gate {
    Issued,
    Verified,
    Open(VerificationRecord),
}

/// Verification service
pub struct VerificationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> VerificationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// `/start`: challenge newcomers, stay silent for everyone else
    #[instrument(skip(self, msg, guard), fields(user_id = %guard.user_id()))]
    pub async fn start(&self, msg: &IncomingMessage, guard: &UserGuard) -> ServiceResult<()> {
        self.gate(msg, guard, FIRST_CONTACT_CAPTION).await?;
        Ok(())
    }

    /// Run the gate for a private message of an unblocked user
    #[instrument(skip(self, msg, profile, guard), fields(user_id = %profile.id))]
    pub async fn admit(
        &self,
        msg: &IncomingMessage,
        profile: &UserProfile,
        guard: &UserGuard,
    ) -> ServiceResult<Admission> {
        debug_assert_eq!(guard.user_id(), profile.id);

        if self.is_verified(profile.id).await? {
            return Ok(Admission::Verified);
        }

        match self.gate(msg, guard, RETRY_CAPTION).await? {
            Gate::Issued => Ok(Admission::Held),
            Gate::Verified => Ok(Admission::Verified),
            Gate::Open(record) => {
                self.check_answer(msg, profile, &record, guard).await?;
                Ok(Admission::Held)
            }
        }
    }

    /// Cached flag, falling back to the repository
    pub async fn is_verified(&self, user_id: UserId) -> ServiceResult<bool> {
        if let Some(verified) = self.ctx.cache().is_verified(user_id) {
            return Ok(verified);
        }
        let verified = self.ctx.verification_repo().is_verified(user_id).await?;
        self.ctx.cache().set_verified(user_id, verified);
        Ok(verified)
    }

    async fn gate(
        &self,
        msg: &IncomingMessage,
        guard: &UserGuard,
        caption: &str,
    ) -> ServiceResult<Gate> {
        let user_id = guard.user_id();
        match self.ctx.verification_repo().find(user_id).await? {
            None => {
                self.issue_challenge(msg, guard, caption).await?;
                Ok(Gate::Issued)
            }
            Some(record) if record.verified => {
                self.ctx.cache().set_verified(user_id, true);
                Ok(Gate::Verified)
            }
            Some(record) if record.is_expired() => {
                self.issue_challenge(msg, guard, EXPIRED_CAPTION).await?;
                Ok(Gate::Issued)
            }
            Some(record) => Ok(Gate::Open(record)),
        }
    }

    /// Render a fresh code, persist it and send the image
    async fn issue_challenge(
        &self,
        msg: &IncomingMessage,
        guard: &UserGuard,
        caption: &str,
    ) -> ServiceResult<()> {
        let user_id = guard.user_id();
        let gateway = self.ctx.gateway();

        let wait = gateway
            .send_text(OutgoingText::new(msg.chat.id, PLEASE_WAIT).reply_to(msg.message_id))
            .await?;

        self.ctx.cache().set_verified(user_id, false);
        self.ctx.cache().reset_attempts(user_id);

        let generator = self.ctx.captcha();
        let captcha = tokio::task::spawn_blocking(move || generator.generate())
            .await
            .map_err(|e| ServiceError::internal(format!("captcha task failed: {e}")))??;

        let ttl = chrono::Duration::from_std(self.ctx.settings().verify_ttl)
            .map_err(|e| ServiceError::internal(format!("verify ttl out of range: {e}")))?;
        let record = VerificationRecord::issue(user_id, captcha.code, ttl);
        self.ctx.verification_repo().upsert(&record).await?;

        if let Err(err) = gateway.delete_message(msg.chat.id, wait).await {
            warn!(error = %err, "Could not delete the wait notice");
        }
        gateway
            .send_animation(msg.chat.id, Some(msg.message_id), captcha.image, caption)
            .await?;

        info!(user_id = %user_id, expires_at = %record.expires_at, "Challenge issued");
        Ok(())
    }

    async fn check_answer(
        &self,
        msg: &IncomingMessage,
        profile: &UserProfile,
        record: &VerificationRecord,
        guard: &UserGuard,
    ) -> ServiceResult<()> {
        let user_id = profile.id;
        let cache = self.ctx.cache();
        let answer = msg.text.as_deref().unwrap_or_default();

        if record.matches(answer) {
            self.ctx.verification_repo().set_verified(user_id, true).await?;
            cache.set_verified(user_id, true);
            cache.reset_attempts(user_id);
            self.reply(msg, "Verification passed, you can send messages now")
                .await?;
            info!(user_id = %user_id, "User verified");

            if let Err(err) = RelayService::new(self.ctx).ensure_topic(profile, guard).await {
                warn!(user_id = %user_id, error = %err, "Topic not created after verification");
            }
            return Ok(());
        }

        let attempts = cache.add_attempt(user_id);
        let remaining = MAX_ATTEMPTS.saturating_sub(attempts);
        if remaining > 0 {
            self.reply(msg, format!("Wrong code, you have {remaining} attempts left."))
                .await?;
            return Ok(());
        }

        cache.set_verified(user_id, false);
        self.ctx
            .block_repo()
            .create(&BlockRecord::automatic(user_id))
            .await?;
        cache.set_blocked(user_id, true);
        warn!(user_id = %user_id, attempts, "User blocked after failed verification");
        self.reply(msg, "Too many wrong codes, you have been banned.")
            .await
    }

    async fn reply(&self, msg: &IncomingMessage, text: impl Into<String>) -> ServiceResult<()> {
        self.ctx
            .gateway()
            .send_text(OutgoingText::new(msg.chat.id, text).reply_to(msg.message_id))
            .await?;
        Ok(())
    }
}
