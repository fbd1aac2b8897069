//! Bot API wire types
//!
//! Only the fields the relay reads are deserialized; everything else in the
//! payload is ignored.

use relay_core::{
    BotIdentity, BotRights, Chat, ChatId, ChatInfo, ChatKind, IncomingMessage, MemberInfo,
    MemberStatus, MessageId, ReactionKind, ReactionUpdate, TopicId, Update, UserId, UserProfile,
};
use serde::{Deserialize, Serialize};

/// Envelope of every Bot API response
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

// ============================================================================
// Inbound
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WireUpdate {
    pub update_id: i64,
    pub message: Option<WireMessage>,
    pub edited_message: Option<WireMessage>,
    pub message_reaction: Option<WireReaction>,
}

impl WireUpdate {
    /// Transport-neutral update, `None` for kinds the relay ignores
    pub fn into_update(self) -> Option<Update> {
        if let Some(message) = self.message {
            return Some(Update::Message(message.into()));
        }
        if let Some(message) = self.edited_message {
            return Some(Update::EditedMessage(message.into()));
        }
        self.message_reaction
            .map(|reaction| Update::Reaction(reaction.into()))
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMessage {
    pub message_id: i64,
    pub message_thread_id: Option<i64>,
    pub chat: WireChat,
    pub from: Option<WireUser>,
    pub text: Option<String>,
    pub reply_to_message: Option<WireMessageRef>,
}

#[derive(Debug, Deserialize)]
pub struct WireMessageRef {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct WireChat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: ChatKind,
    #[serde(default)]
    pub is_forum: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireUser {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    #[serde(default)]
    pub is_premium: bool,
}

#[derive(Debug, Deserialize)]
pub struct WireReaction {
    pub chat: WireChat,
    pub message_id: i64,
    pub user: Option<WireUser>,
    #[serde(default)]
    pub new_reaction: Vec<ReactionKind>,
}

impl From<WireChat> for Chat {
    fn from(chat: WireChat) -> Self {
        Self {
            id: ChatId::new(chat.id),
            kind: chat.kind,
            is_forum: chat.is_forum,
        }
    }
}

impl From<WireUser> for UserProfile {
    fn from(user: WireUser) -> Self {
        Self {
            id: UserId::new(user.id),
            is_bot: user.is_bot,
            first_name: user.first_name,
            last_name: user.last_name,
            username: user.username,
            language_code: user.language_code,
            is_premium: user.is_premium,
        }
    }
}

impl From<WireMessage> for IncomingMessage {
    fn from(message: WireMessage) -> Self {
        Self {
            chat: message.chat.into(),
            from: message.from.map(Into::into),
            message_id: MessageId::new(message.message_id),
            thread_id: message.message_thread_id.map(TopicId::new),
            text: message.text,
            reply_to: message
                .reply_to_message
                .map(|reply| MessageId::new(reply.message_id)),
        }
    }
}

impl From<WireReaction> for ReactionUpdate {
    fn from(reaction: WireReaction) -> Self {
        Self {
            chat: reaction.chat.into(),
            message_id: MessageId::new(reaction.message_id),
            user: reaction.user.map(Into::into),
            new_reaction: reaction.new_reaction,
        }
    }
}

// ============================================================================
// Results
// ============================================================================

/// Sent, forwarded or copied message
#[derive(Debug, Deserialize)]
pub struct WireMessageId {
    pub message_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct WireForumTopic {
    pub message_thread_id: i64,
}

#[derive(Debug, Deserialize)]
pub struct WireMe {
    pub id: i64,
    pub first_name: String,
    pub username: Option<String>,
    #[serde(default)]
    pub can_read_all_group_messages: bool,
}

impl From<WireMe> for BotIdentity {
    fn from(me: WireMe) -> Self {
        Self {
            id: UserId::new(me.id),
            first_name: me.first_name,
            username: me.username,
            can_read_all_group_messages: me.can_read_all_group_messages,
        }
    }
}

impl From<WireChat> for ChatInfo {
    fn from(chat: WireChat) -> Self {
        Self {
            id: ChatId::new(chat.id),
            kind: chat.kind,
            is_forum: chat.is_forum,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireMember {
    pub status: String,
    #[serde(default)]
    pub can_manage_topics: bool,
    #[serde(default)]
    pub can_delete_messages: bool,
    #[serde(default)]
    pub can_pin_messages: bool,
    #[serde(default)]
    pub can_restrict_members: bool,
}

impl From<WireMember> for MemberInfo {
    fn from(member: WireMember) -> Self {
        let status = match member.status.as_str() {
            "creator" => MemberStatus::Creator,
            "administrator" => MemberStatus::Administrator,
            "restricted" => MemberStatus::Restricted,
            "left" => MemberStatus::Left,
            "kicked" => MemberStatus::Kicked,
            _ => MemberStatus::Member,
        };

        let rights = if status == MemberStatus::Creator {
            BotRights::all()
        } else {
            let mut rights = BotRights::empty();
            rights.set(BotRights::MANAGE_TOPICS, member.can_manage_topics);
            rights.set(BotRights::DELETE_MESSAGES, member.can_delete_messages);
            rights.set(BotRights::PIN_MESSAGES, member.can_pin_messages);
            rights.set(BotRights::RESTRICT_MEMBERS, member.can_restrict_members);
            rights
        };

        Self { status, rights }
    }
}

// ============================================================================
// Requests
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ReplyParameters {
    pub message_id: i64,
    pub allow_sending_without_reply: bool,
}

impl ReplyParameters {
    pub fn to(message_id: MessageId) -> Self {
        Self {
            message_id: message_id.into_inner(),
            allow_sending_without_reply: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendMessage<'a> {
    pub chat_id: i64,
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reply_parameters: Option<ReplyParameters>,
}

/// Body shared by `forwardMessage` and `copyMessage`
#[derive(Debug, Serialize)]
pub struct RelayMessage {
    pub chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    pub from_chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct EditMessageText<'a> {
    pub chat_id: i64,
    pub message_id: i64,
    pub text: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MessageRef {
    pub chat_id: i64,
    pub message_id: i64,
}

#[derive(Debug, Serialize)]
pub struct PinMessage {
    pub chat_id: i64,
    pub message_id: i64,
    pub disable_notification: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateForumTopic<'a> {
    pub chat_id: i64,
    pub name: &'a str,
}

#[derive(Debug, Serialize)]
pub struct SetMessageReaction {
    pub chat_id: i64,
    pub message_id: i64,
    pub reaction: Vec<ReactionKind>,
}

#[derive(Debug, Serialize)]
pub struct SendChatAction {
    pub chat_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_thread_id: Option<i64>,
    pub action: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ChatRef {
    pub chat_id: i64,
}

#[derive(Debug, Serialize)]
pub struct GetChatMember {
    pub chat_id: i64,
    pub user_id: i64,
}

#[derive(Debug, Serialize)]
pub struct WireBotCommand {
    pub command: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SetMyCommands {
    pub commands: Vec<WireBotCommand>,
}

#[derive(Debug, Serialize)]
pub struct GetUpdates {
    pub offset: i64,
    pub timeout: u64,
    pub allowed_updates: &'static [&'static str],
}

/// Update kinds the relay subscribes to
pub const ALLOWED_UPDATES: &[&str] = &["message", "edited_message", "message_reaction"];
