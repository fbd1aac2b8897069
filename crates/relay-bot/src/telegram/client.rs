//! Bot API client
//!
//! Every method is a JSON POST to `{api_base_url}/bot{token}/{method}`; the
//! captcha upload is the one multipart request. Error responses are decoded
//! from the envelope whatever the HTTP status.

use std::time::Duration;

use async_trait::async_trait;
use relay_common::TelegramConfig;
use relay_core::{
    BotCommand, BotIdentity, ChatId, ChatInfo, GatewayError, GatewayResult, MemberInfo,
    MessageId, MessagingGateway, OutgoingText, ReactionKind, TopicId, UserId,
};
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, instrument};

use super::types::{
    ApiResponse, ChatRef, CreateForumTopic, EditMessageText, GetChatMember, GetUpdates,
    MessageRef, PinMessage, RelayMessage, ReplyParameters, SendChatAction, SendMessage,
    SetMessageReaction, SetMyCommands, WireBotCommand, WireChat, WireForumTopic, WireMe,
    WireMember, WireMessageId, WireUpdate, ALLOWED_UPDATES,
};

/// Deadline of ordinary requests
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
/// Slack added on top of the long-poll timeout
const POLL_SLACK: Duration = Duration::from_secs(10);

/// Telegram Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(config: &TelegramConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base: format!(
                "{}/bot{}",
                config.api_base_url.trim_end_matches('/'),
                config.token
            ),
        })
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.base)
    }

    async fn call<P, R>(&self, method: &str, params: &P) -> GatewayResult<R>
    where
        P: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.url(method))
            .json(params)
            .send()
            .await
            .map_err(transport_error)?;
        decode(method, response).await
    }

    /// Fetch the next batch of updates after `offset`
    #[instrument(skip(self))]
    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> GatewayResult<Vec<WireUpdate>> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ALLOWED_UPDATES,
        };
        let response = self
            .http
            .post(self.url("getUpdates"))
            .timeout(Duration::from_secs(timeout_secs) + POLL_SLACK)
            .json(&params)
            .send()
            .await
            .map_err(transport_error)?;
        decode("getUpdates", response).await
    }
}

impl std::fmt::Debug for TelegramClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The base URL embeds the token
        f.debug_struct("TelegramClient").finish_non_exhaustive()
    }
}

fn transport_error(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::TimedOut
    } else {
        GatewayError::Network(err.without_url().to_string())
    }
}

async fn decode<R: DeserializeOwned>(method: &str, response: reqwest::Response) -> GatewayResult<R> {
    let status = response.status();
    let body = response.bytes().await.map_err(transport_error)?;

    let envelope: ApiResponse<R> = match serde_json::from_slice(&body) {
        Ok(envelope) => envelope,
        Err(err) => {
            return Err(GatewayError::Api {
                code: i64::from(status.as_u16()),
                description: format!("undecodable {method} response: {err}"),
            })
        }
    };

    if envelope.ok {
        return envelope.result.ok_or_else(|| GatewayError::Api {
            code: i64::from(status.as_u16()),
            description: format!("{method} returned no result"),
        });
    }

    let description = envelope
        .description
        .unwrap_or_else(|| "no description".to_string());
    debug!(method, code = ?envelope.error_code, %description, "Bot API request rejected");
    Err(match envelope.error_code {
        Some(400) => GatewayError::BadRequest(description),
        Some(403) => GatewayError::Forbidden(description),
        code => GatewayError::Api {
            code: code.unwrap_or_else(|| i64::from(status.as_u16())),
            description,
        },
    })
}

#[async_trait]
impl MessagingGateway for TelegramClient {
    async fn send_text(&self, message: OutgoingText) -> GatewayResult<MessageId> {
        let sent: WireMessageId = self
            .call(
                "sendMessage",
                &SendMessage {
                    chat_id: message.chat_id.into_inner(),
                    text: &message.text,
                    message_thread_id: message.thread_id.map(TopicId::into_inner),
                    reply_parameters: message.reply_to.map(ReplyParameters::to),
                },
            )
            .await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn send_animation(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        animation: Vec<u8>,
        caption: &str,
    ) -> GatewayResult<MessageId> {
        let part = Part::bytes(animation)
            .file_name("captcha.gif")
            .mime_str("image/gif")
            .map_err(transport_error)?;
        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("animation", part);
        if let Some(reply_to) = reply_to {
            let reply = serde_json::to_string(&ReplyParameters::to(reply_to))
                .map_err(|e| GatewayError::BadRequest(e.to_string()))?;
            form = form.text("reply_parameters", reply);
        }

        let response = self
            .http
            .post(self.url("sendAnimation"))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;
        let sent: WireMessageId = decode("sendAnimation", response).await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn forward_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        let sent: WireMessageId = self
            .call(
                "forwardMessage",
                &RelayMessage {
                    chat_id: chat_id.into_inner(),
                    message_thread_id: thread_id.map(TopicId::into_inner),
                    from_chat_id: from_chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                },
            )
            .await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn copy_message(
        &self,
        chat_id: ChatId,
        thread_id: Option<TopicId>,
        from_chat_id: ChatId,
        message_id: MessageId,
    ) -> GatewayResult<MessageId> {
        let sent: WireMessageId = self
            .call(
                "copyMessage",
                &RelayMessage {
                    chat_id: chat_id.into_inner(),
                    message_thread_id: thread_id.map(TopicId::into_inner),
                    from_chat_id: from_chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                },
            )
            .await?;
        Ok(MessageId::new(sent.message_id))
    }

    async fn edit_message_text(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
    ) -> GatewayResult<()> {
        // The result is the edited message, or `true` for inline messages
        let _: serde_json::Value = self
            .call(
                "editMessageText",
                &EditMessageText {
                    chat_id: chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                    text,
                },
            )
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()> {
        let _: bool = self
            .call(
                "deleteMessage",
                &MessageRef {
                    chat_id: chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                },
            )
            .await?;
        Ok(())
    }

    async fn create_forum_topic(&self, chat_id: ChatId, name: &str) -> GatewayResult<TopicId> {
        let topic: WireForumTopic = self
            .call(
                "createForumTopic",
                &CreateForumTopic {
                    chat_id: chat_id.into_inner(),
                    name,
                },
            )
            .await?;
        Ok(TopicId::new(topic.message_thread_id))
    }

    async fn pin_message(&self, chat_id: ChatId, message_id: MessageId) -> GatewayResult<()> {
        let _: bool = self
            .call(
                "pinChatMessage",
                &PinMessage {
                    chat_id: chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                    disable_notification: true,
                },
            )
            .await?;
        Ok(())
    }

    async fn set_reaction(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        reaction: Option<ReactionKind>,
    ) -> GatewayResult<()> {
        let _: bool = self
            .call(
                "setMessageReaction",
                &SetMessageReaction {
                    chat_id: chat_id.into_inner(),
                    message_id: message_id.into_inner(),
                    reaction: reaction.into_iter().collect(),
                },
            )
            .await?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: ChatId, thread_id: Option<TopicId>) -> GatewayResult<()> {
        let _: bool = self
            .call(
                "sendChatAction",
                &SendChatAction {
                    chat_id: chat_id.into_inner(),
                    message_thread_id: thread_id.map(TopicId::into_inner),
                    action: "typing",
                },
            )
            .await?;
        Ok(())
    }

    async fn get_me(&self) -> GatewayResult<BotIdentity> {
        let me: WireMe = self.call("getMe", &serde_json::json!({})).await?;
        Ok(me.into())
    }

    async fn get_chat(&self, chat_id: ChatId) -> GatewayResult<ChatInfo> {
        let chat: WireChat = self
            .call(
                "getChat",
                &ChatRef {
                    chat_id: chat_id.into_inner(),
                },
            )
            .await?;
        Ok(chat.into())
    }

    async fn get_chat_member(&self, chat_id: ChatId, user_id: UserId) -> GatewayResult<MemberInfo> {
        let member: WireMember = self
            .call(
                "getChatMember",
                &GetChatMember {
                    chat_id: chat_id.into_inner(),
                    user_id: user_id.into_inner(),
                },
            )
            .await?;
        Ok(member.into())
    }

    async fn set_my_commands(&self, commands: &[BotCommand]) -> GatewayResult<()> {
        let params = SetMyCommands {
            commands: commands
                .iter()
                .map(|cmd| WireBotCommand {
                    command: cmd.command,
                    description: cmd.description,
                })
                .collect(),
        };
        let _: bool = self.call("setMyCommands", &params).await?;
        Ok(())
    }
}
