//! Inbound updates
//!
//! A transport-neutral view of what the Bot API delivers. Only the fields the
//! relay reads are modelled.

use serde::{Deserialize, Serialize};

use crate::value_objects::{ChatId, MessageId, TopicId, UserId};

/// Maximum display length before the topic name falls back to the first name
const MAX_FULL_NAME_CHARS: usize = 32;
/// Characters of the first name kept by the fallback
const FALLBACK_FIRST_NAME_CHARS: usize = 16;

/// Kind of chat an update originated from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

/// Chat an update originated from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chat {
    pub id: ChatId,
    pub kind: ChatKind,
    pub is_forum: bool,
}

impl Chat {
    pub fn private(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Private,
            is_forum: false,
        }
    }

    pub fn forum(id: ChatId) -> Self {
        Self {
            id,
            kind: ChatKind::Supergroup,
            is_forum: true,
        }
    }

    #[inline]
    pub fn is_private(&self) -> bool {
        self.kind == ChatKind::Private
    }
}

/// Public profile of the sender
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub id: UserId,
    pub is_bot: bool,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: bool,
}

impl UserProfile {
    pub fn new(id: UserId, first_name: impl Into<String>) -> Self {
        Self {
            id,
            is_bot: false,
            first_name: first_name.into(),
            last_name: None,
            username: None,
            language_code: None,
            is_premium: false,
        }
    }

    /// First and last name joined by a space
    pub fn full_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// Name shown in the staff group, shortened for very long names
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.chars().count() > MAX_FULL_NAME_CHARS {
            self.first_name.chars().take(FALLBACK_FIRST_NAME_CHARS).collect()
        } else {
            full
        }
    }

    /// Forum topic title for this user
    pub fn topic_name(&self) -> String {
        format!("{} {}", self.display_name(), self.id)
    }
}

/// Parsed bot command, e.g. `/verify true`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a str,
    pub args: Vec<&'a str>,
}

/// A message or an edited message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub chat: Chat,
    pub from: Option<UserProfile>,
    pub message_id: MessageId,
    pub thread_id: Option<TopicId>,
    pub text: Option<String>,
    pub reply_to: Option<MessageId>,
}

impl IncomingMessage {
    /// Sender id, if the message has a sender
    pub fn sender_id(&self) -> Option<UserId> {
        self.from.as_ref().map(|from| from.id)
    }

    /// Parse a leading `/command[@bot] args...`
    pub fn command(&self) -> Option<Command<'_>> {
        let text = self.text.as_deref()?;
        let rest = text.strip_prefix('/')?;
        let mut parts = rest.split_whitespace();
        let head = parts.next()?;
        let name = head.split('@').next().unwrap_or(head);
        if name.is_empty() {
            return None;
        }
        Some(Command {
            name,
            args: parts.collect(),
        })
    }

    #[inline]
    pub fn is_command(&self) -> bool {
        self.command().is_some()
    }

    /// Reply target, ignoring the implicit reply to a forum thread's root
    pub fn reply_target(&self) -> Option<MessageId> {
        let reply = self.reply_to?;
        match self.thread_id {
            Some(thread) if thread.into_inner() == reply.into_inner() => None,
            _ => Some(reply),
        }
    }
}

/// A single reaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ReactionKind {
    Emoji { emoji: String },
    CustomEmoji { custom_emoji_id: String },
    Paid,
}

/// Change of reactions on a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReactionUpdate {
    pub chat: Chat,
    pub message_id: MessageId,
    pub user: Option<UserProfile>,
    pub new_reaction: Vec<ReactionKind>,
}

/// Everything the dispatcher routes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Update {
    Message(IncomingMessage),
    EditedMessage(IncomingMessage),
    Reaction(ReactionUpdate),
}
