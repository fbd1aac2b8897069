use std::collections::HashSet;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use relay_core::{
    BotCommand, BotIdentity, BotRights, ChatId, ChatInfo, ChatKind, GatewayError, GatewayResult,
    MemberInfo, MemberStatus, MessageId, MessagingGateway, OutgoingText, ReactionKind, TopicId,
    UserId,
};

/// Id of the bot account reported by `get_me`
pub const BOT_ID: UserId = UserId::new(7_000);

/// One recorded gateway request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    SendText(OutgoingText),
    SendAnimation {
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        caption: String,
    },
    Forward {
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
        result: MessageId,
    },
    Copy {
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
        result: MessageId,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
    },
    Delete {
        chat_id: ChatId,
        message_id: MessageId,
    },
    CreateTopic {
        name: String,
        result: TopicId,
    },
    Pin {
        chat_id: ChatId,
        message_id: MessageId,
    },
    Reaction {
        chat_id: ChatId,
        message_id: MessageId,
        reaction: Option<ReactionKind>,
    },
    SetCommands(usize),
}

#[derive(Debug, Default)]
struct Failures {
    /// Copies into these chats fail with `Forbidden`
    forbidden_copy: HashSet<ChatId>,
    /// Texts sent to these chats fail with `Forbidden`
    forbidden_text: HashSet<ChatId>,
    /// Texts posted into these threads fail with `BadRequest`
    missing_threads: HashSet<TopicId>,
    /// Deletes in these chats fail with `BadRequest`
    undeletable: HashSet<ChatId>,
    /// Every relaying call fails with `TimedOut`
    timed_out: bool,
    topic_creation: bool,
}

/// Gateway double that records every request and hands out fresh ids
#[derive(Debug)]
pub struct RecordingGateway {
    calls: Mutex<Vec<Call>>,
    typing: AtomicUsize,
    next_message: AtomicI64,
    next_topic: AtomicI64,
    failures: Mutex<Failures>,
    chat: Mutex<ChatInfo>,
    member: Mutex<MemberInfo>,
    identity: Mutex<BotIdentity>,
}

impl RecordingGateway {
    /// Gateway whose staff chat passes every self-test check
    pub fn new(staff_chat_id: ChatId) -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            typing: AtomicUsize::new(0),
            next_message: AtomicI64::new(1_000),
            next_topic: AtomicI64::new(500),
            failures: Mutex::new(Failures::default()),
            chat: Mutex::new(ChatInfo {
                id: staff_chat_id,
                kind: ChatKind::Supergroup,
                is_forum: true,
            }),
            member: Mutex::new(MemberInfo {
                status: MemberStatus::Administrator,
                rights: BotRights::all(),
            }),
            identity: Mutex::new(BotIdentity {
                id: BOT_ID,
                first_name: "Relay".to_string(),
                username: Some("relay_bot".to_string()),
                can_read_all_group_messages: true,
            }),
        }
    }

    // === Failure injection ===

    pub fn forbid_copies_to(&self, chat_id: ChatId) {
        self.failures.lock().forbidden_copy.insert(chat_id);
    }

    pub fn forbid_texts_to(&self, chat_id: ChatId) {
        self.failures.lock().forbidden_text.insert(chat_id);
    }

    pub fn remove_thread(&self, thread: TopicId) {
        self.failures.lock().missing_threads.insert(thread);
    }

    pub fn fail_deletes_in(&self, chat_id: ChatId) {
        self.failures.lock().undeletable.insert(chat_id);
    }

    pub fn set_timed_out(&self, timed_out: bool) {
        self.failures.lock().timed_out = timed_out;
    }

    pub fn fail_topic_creation(&self) {
        self.failures.lock().topic_creation = true;
    }

    // === Self-test metadata ===

    pub fn set_chat(&self, kind: ChatKind, is_forum: bool) {
        let mut chat = self.chat.lock();
        chat.kind = kind;
        chat.is_forum = is_forum;
    }

    pub fn set_member(&self, status: MemberStatus, rights: BotRights) {
        *self.member.lock() = MemberInfo { status, rights };
    }

    pub fn set_privacy_mode(&self, enabled: bool) {
        self.identity.lock().can_read_all_group_messages = !enabled;
    }

    // === Inspection ===

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    pub fn typing_count(&self) -> usize {
        self.typing.load(Ordering::SeqCst)
    }

    /// Texts sent to `chat_id`, in order
    pub fn texts_to(&self, chat_id: ChatId) -> Vec<String> {
        self.sent_texts()
            .into_iter()
            .filter(|msg| msg.chat_id == chat_id)
            .map(|msg| msg.text)
            .collect()
    }

    pub fn sent_texts(&self) -> Vec<OutgoingText> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SendText(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn captions(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::SendAnimation { caption, .. } => Some(caption.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn copies(&self) -> Vec<Call> {
        self.matching(|call| matches!(call, Call::Copy { .. }))
    }

    pub fn forwards(&self) -> Vec<Call> {
        self.matching(|call| matches!(call, Call::Forward { .. }))
    }

    pub fn deletes(&self) -> Vec<(ChatId, MessageId)> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::Delete {
                    chat_id,
                    message_id,
                } => Some((*chat_id, *message_id)),
                _ => None,
            })
            .collect()
    }

    pub fn created_topics(&self) -> Vec<String> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                Call::CreateTopic { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn matching(&self, pred: impl Fn(&Call) -> bool) -> Vec<Call> {
        self.calls
            .lock()
            .iter()
            .filter(|call| pred(call))
            .cloned()
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }

    fn message_id(&self) -> MessageId {
        MessageId::new(self.next_message.fetch_add(1, Ordering::SeqCst))
    }

    fn check_timeout(&self) -> GatewayResult<()> {
        if self.failures.lock().timed_out {
            return Err(GatewayError::TimedOut);
        }
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for RecordingGateway {
    async fn send_text(&self, message: OutgoingText) -> GatewayResult<MessageId> {
        let missing = message
            .thread_id
            .is_some_and(|thread| self.failures.lock().missing_threads.contains(&thread));
        if missing {
            return Err(GatewayError::BadRequest(
                "message thread not found".to_string(),
            ));
        }
        if self.failures.lock().forbidden_text.contains(&message.chat_id) {
            return Err(GatewayError::Forbidden(
                "bot was blocked by the user".to_string(),
            ));
        }
        self.record(Call::SendText(message));
        Ok(self.message_id())
    }

    async fn send_animation(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        _animation: Vec<u8>,
        caption: &str,
    ) -> GatewayResult<MessageId> {
        self.record(Call::SendAnimation {
            chat_id,
            reply_to,
            caption: caption.to_string(),
        });
        Ok(self.message_id())
    }

    async fn forward_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        self.check_timeout()?;
        let result = self.message_id();
        self.record(Call::Forward {
            chat_id,
            thread_id,
            from_chat_id,
            message_id,
            result,
        });
        Ok(result)
    }

    async fn copy_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        self.check_timeout()?;
        if self.failures.lock().forbidden_copy.contains(&chat_id) {
            return Err(GatewayError::Forbidden(
                "bot was blocked by the user".to_string(),
            ));
        }
        let result = self.message_id();
        self.record(Call::Copy {
            chat_id,
            thread_id,
            from_chat_id,
            message_id,
            result,
        });
        Ok(result)
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> GatewayResult<()> {
        self.record(Call::Edit {
            chat_id,
            message_id,
            text: text.to_string(),
        });
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()> {
        if self.failures.lock().undeletable.contains(&chat_id) {
            return Err(GatewayError::BadRequest(
                "message can't be deleted".to_string(),
            ));
        }
        self.record(Call::Delete {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn create_forum_topic(&self, _chat_id: ChatId, name: &str) -> GatewayResult<TopicId> {
        if self.failures.lock().topic_creation {
            return Err(GatewayError::BadRequest("not enough rights".to_string()));
        }
        let result = TopicId::new(self.next_topic.fetch_add(1, Ordering::SeqCst));
        self.record(Call::CreateTopic {
            name: name.to_string(),
            result,
        });
        Ok(result)
    }

    async fn pin_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()> {
        self.record(Call::Pin {
            chat_id,
            message_id,
        });
        Ok(())
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reaction: Option<ReactionKind>,
    ) -> GatewayResult<()> {
        self.record(Call::Reaction {
            chat_id,
            message_id,
            reaction,
        });
        Ok(())
    }

    async fn send_typing(&self, _chat_id: ChatId, _thread_id: Option<TopicId>) -> GatewayResult<()> {
        self.typing.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_me(&self) -> GatewayResult<BotIdentity> {
        Ok(self.identity.lock().clone())
    }

    async fn get_chat(&self, _chat_id: ChatId) -> GatewayResult<ChatInfo> {
        Ok(self.chat.lock().clone())
    }

    async fn get_chat_member(
        &self,
        _chat_id: ChatId,
        _user_id: UserId,
    ) -> GatewayResult<MemberInfo> {
        Ok(self.member.lock().clone())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> GatewayResult<()> {
        self.record(Call::SetCommands(commands.len()));
        Ok(())
    }
}
