//! Collaborator ports - messaging gateway, spam classifier, captcha generator
//!
//! The relay treats all three as fallible remote services.

use async_trait::async_trait;
use thiserror::Error;

use crate::events::{ChatKind, ReactionKind};
use crate::value_objects::{BotRights, ChatId, MessageId, TopicId, UserId};

// ============================================================================
// Messaging Gateway
// ============================================================================

/// Errors reported by the messaging gateway
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The request did not complete in time; delivery is unknown
    #[error("Request timed out")]
    TimedOut,

    /// The recipient blocked the bot or the bot lacks rights
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request referenced something that does not exist
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error {code}: {description}")]
    Api { code: i64, description: String },
}

impl GatewayError {
    #[inline]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut)
    }

    #[inline]
    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    #[inline]
    pub fn is_bad_request(&self) -> bool {
        matches!(self, Self::BadRequest(_))
    }
}

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Text message to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingText {
    pub chat_id: ChatId,
    pub thread_id: Option<TopicId>,
    pub text: String,
    pub reply_to: Option<MessageId>,
}

impl OutgoingText {
    pub fn new(chat_id: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            thread_id: None,
            text: text.into(),
            reply_to: None,
        }
    }

    /// Post into a forum thread
    #[must_use]
    pub fn in_thread(mut self, thread_id: TopicId) -> Self {
        self.thread_id = Some(thread_id);
        self
    }

    /// Post as a reply
    #[must_use]
    pub fn reply_to(mut self, message_id: MessageId) -> Self {
        self.reply_to = Some(message_id);
        self
    }
}

/// Identity of the bot account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: UserId,
    pub first_name: String,
    pub username: Option<String>,
    /// `false` while privacy mode is enabled
    pub can_read_all_group_messages: bool,
}

/// Metadata of a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatInfo {
    pub id: ChatId,
    pub kind: ChatKind,
    pub is_forum: bool,
}

/// Membership status of a chat member
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberStatus {
    Creator,
    Administrator,
    Member,
    Restricted,
    Left,
    Kicked,
}

impl MemberStatus {
    #[inline]
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Creator | Self::Administrator)
    }
}

/// Membership of the bot in a chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub status: MemberStatus,
    pub rights: BotRights,
}

/// Command advertised in the client's command menu
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a text message
    async fn send_text(&self, message: OutgoingText) -> GatewayResult<MessageId>;

    /// Send an animation (GIF) with a caption, optionally as a reply
    async fn send_animation(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        animation: Vec<u8>,
        caption: &str,
    ) -> GatewayResult<MessageId>;

    /// Forward a message, keeping the original author header
    async fn forward_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId>;

    /// Copy a message without the author header
    async fn copy_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId>;

    /// Replace the text of a message
    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> GatewayResult<()>;

    /// Delete a message
    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()>;

    /// Create a forum topic and return its thread id
    async fn create_forum_topic(&self, chat_id: ChatId, name: &str) -> GatewayResult<TopicId>;

    /// Pin a message without notifying members
    async fn pin_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()>;

    /// Set the bot's reaction on a message; `None` clears it
    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reaction: Option<ReactionKind>,
    ) -> GatewayResult<()>;

    /// Show the "typing" indicator
    async fn send_typing(&self, chat_id: ChatId, thread_id: Option<TopicId>) -> GatewayResult<()>;

    /// Identity of the bot
    async fn get_me(&self) -> GatewayResult<BotIdentity>;

    /// Metadata of a chat
    async fn get_chat(&self, chat_id: ChatId) -> GatewayResult<ChatInfo>;

    /// Membership of a user in a chat
    async fn get_chat_member(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<MemberInfo>;

    /// Register the command menu
    async fn set_my_commands(&self, commands: &[BotCommand]) -> GatewayResult<()>;
}

// ============================================================================
// Classifier
// ============================================================================

/// Declared classifier failures
///
/// `Timeout`, `Backend` and `InvalidSchema` degrade to the keyword fallback;
/// `Unknown` is propagated.
#[derive(Debug, Clone, Error)]
pub enum ClassifierError {
    #[error("Classifier timed out")]
    Timeout,

    #[error("Classifier backend error: {0}")]
    Backend(String),

    #[error("Classifier answer violates the schema: {0}")]
    InvalidSchema(String),

    #[error("Unexpected classifier failure: {0}")]
    Unknown(String),
}

impl ClassifierError {
    /// Whether the keyword fallback may replace the answer
    #[inline]
    pub fn is_degradable(&self) -> bool {
        !matches!(self, Self::Unknown(_))
    }
}

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Raw answer of the backend for one message
    async fn classify(&self, text: &str) -> Result<String, ClassifierError>;

    /// `false` when credentials are missing; the fallback is then permanent
    fn is_configured(&self) -> bool;
}

// ============================================================================
// Captcha Generator
// ============================================================================

#[derive(Debug, Error)]
pub enum CaptchaError {
    #[error("Failed to render captcha: {0}")]
    Render(String),
}

/// Challenge code and its rendered image
#[derive(Clone)]
pub struct Captcha {
    pub code: String,
    pub image: Vec<u8>,
}

impl std::fmt::Debug for Captcha {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Captcha")
            .field("code", &"*****")
            .field("image_len", &self.image.len())
            .finish()
    }
}

/// CPU-bound; callers run it on the blocking pool
pub trait CaptchaGenerator: Send + Sync {
    fn generate(&self) -> Result<Captcha, CaptchaError>;
}
