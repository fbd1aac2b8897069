//! OpenAI-compatible chat-completions classifier
//!
//! Returns the raw answer text; schema validation and the deadline belong to
//! the moderation service.

use std::time::Duration;

use async_trait::async_trait;
use relay_common::ClassifierConfig;
use relay_core::{Classifier, ClassifierError};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Transport deadline; the moderation service applies a shorter one
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

pub const SYSTEM_PROMPT: &str = "\
You are a Telegram message moderation detector.

Task: given exactly ONE user message, decide whether it should be BLOCKED. \
The output field is named 'spam' but it means 'should block'.

Set 'spam' to true if the message contains ANY of: \
(1) spam, unsolicited promotion or ads; \
(2) abuse, insults or profanity; \
(3) harassment, hate, threats, scams, illegal or explicit sexual content; \
(4) any clear violation of common community rules. \
Otherwise set 'spam' to false.

If the reason you give describes a violation, 'spam' MUST be true. \
When uncertain, choose true.

Return ONLY a JSON object, no markdown and no extra text, exactly in this schema: \
{\"spam\": <true|false>, \"reason\": \"<reason in at most 50 words>\"}

Examples:
Input: add me on chat for free resources
Output: {\"spam\": true, \"reason\": \"Looks like traffic diversion or advertising.\"}
Input: hello, how do I use this?
Output: {\"spam\": false, \"reason\": \"Ordinary question, no violation.\"}";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AnswerMessage,
}

#[derive(Debug, Deserialize)]
struct AnswerMessage {
    content: Option<String>,
    /// Chain of thought some providers return alongside the answer
    #[serde(default, alias = "reasoning_content")]
    reasoning: Option<String>,
}

/// Chat-completions client
pub struct OpenAiClassifier {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    token: String,
    json_mode: bool,
    configured: bool,
}

impl OpenAiClassifier {
    pub fn new(config: &ClassifierConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(Self {
            http,
            endpoint: format!(
                "{}/chat/completions",
                config.base_url.trim().trim_end_matches('/')
            ),
            model: config.model.clone(),
            token: config.token.clone(),
            json_mode: config.json_mode,
            configured: config.is_configured(),
        })
    }

    fn request<'a>(&'a self, text: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: text,
                },
            ],
            temperature: 0.0,
            stream: false,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

impl std::fmt::Debug for OpenAiClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClassifier")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("json_mode", &self.json_mode)
            .finish_non_exhaustive()
    }
}

fn request_error(err: reqwest::Error) -> ClassifierError {
    if err.is_timeout() {
        ClassifierError::Timeout
    } else if err.is_builder() {
        ClassifierError::Unknown(err.to_string())
    } else {
        ClassifierError::Backend(err.to_string())
    }
}

#[async_trait]
impl Classifier for OpenAiClassifier {
    #[instrument(skip(self, text), fields(model = %self.model, len = text.len()))]
    async fn classify(&self, text: &str) -> Result<String, ClassifierError> {
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&self.request(text))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassifierError::Backend(format!("HTTP {status}: {body}")));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ClassifierError::InvalidSchema(e.to_string()))?;
        let message = body
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or_else(|| ClassifierError::InvalidSchema("no choices".to_string()))?;

        debug!(reasoning = ?message.reasoning, answer = ?message.content, "Classifier answered");
        message
            .content
            .ok_or_else(|| ClassifierError::InvalidSchema("empty answer".to_string()))
    }

    fn is_configured(&self) -> bool {
        self.configured
    }
}
