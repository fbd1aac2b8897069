//! Spam moderation
//!
//! Wraps the classifier with the process-wide rate limiter, a hard deadline
//! and the keyword fallback. `Timeout`, `Backend` and `InvalidSchema` fall back
//! to keywords; `Unknown` is returned to the caller.

use std::time::{Duration, Instant};

use relay_core::{ClassifierError, TopicId, Verdict};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use super::context::ServiceContext;
use super::error::ServiceResult;
use super::keywords::KeywordList;

/// Limiter waits from this long on are logged as throttling
const SLOW_ACQUIRE: Duration = Duration::from_millis(100);

/// Reason of a non-text message that skipped classification
pub const NON_TEXT_REASON: &str = "non-text message";

/// Moderation service
pub struct ModerationService<'a> {
    ctx: &'a ServiceContext,
}

impl<'a> ModerationService<'a> {
    pub fn new(ctx: &'a ServiceContext) -> Self {
        Self { ctx }
    }

    /// Judge one message text
    ///
    /// While the classifier runs, a typing indicator is kept alive in
    /// `typing_thread` of the staff chat.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn check(&self, text: &str, typing_thread: Option<TopicId>) -> ServiceResult<Verdict> {
        if !self.ctx.classifier().is_configured() {
            warn!("Classifier not configured, falling back to keywords");
            return Ok(keyword_verdict(self.ctx.keywords(), text));
        }

        self.acquire_token().await;

        match self.classify_with_typing(text, typing_thread).await {
            Ok(verdict) => {
                debug!(spam = verdict.is_spam, reason = %verdict.reason, "Classifier verdict");
                Ok(verdict)
            }
            Err(err) if err.is_degradable() => {
                error!(error = %err, "Classifier unavailable, degraded mode: keyword fallback");
                Ok(keyword_verdict(self.ctx.keywords(), text))
            }
            Err(err) => {
                error!(error = %err, "Unexpected classifier failure");
                Err(err.into())
            }
        }
    }

    async fn acquire_token(&self) {
        let started = Instant::now();
        self.ctx.limiter().until_ready().await;
        let waited = started.elapsed();
        if waited >= SLOW_ACQUIRE {
            warn!(waited = ?waited, "Classifier rate limit hit, request delayed");
        } else {
            debug!(waited = ?waited, "Classifier token acquired");
        }
    }

    async fn classify_with_typing(
        &self,
        text: &str,
        typing_thread: Option<TopicId>,
    ) -> Result<Verdict, ClassifierError> {
        let typing = self.spawn_typing(typing_thread);
        let result = self.classify(text).await;

        typing.abort();
        if let Err(err) = typing.await {
            if !err.is_cancelled() {
                warn!(error = %err, "Typing indicator task failed");
            }
        }
        result
    }

    async fn classify(&self, text: &str) -> Result<Verdict, ClassifierError> {
        let deadline = self.ctx.settings().classify_timeout;
        let raw = tokio::time::timeout(deadline, self.ctx.classifier().classify(text))
            .await
            .map_err(|_| ClassifierError::Timeout)??;

        Verdict::from_json(&raw).map_err(|e| ClassifierError::InvalidSchema(e.to_string()))
    }

    fn spawn_typing(&self, thread: Option<TopicId>) -> JoinHandle<()> {
        let gateway = self.ctx.gateway_handle();
        let chat_id = self.ctx.staff_chat_id();
        let interval = self.ctx.settings().typing_interval;

        tokio::spawn(async move {
            loop {
                if let Err(err) = gateway.send_typing(chat_id, thread).await {
                    debug!(error = %err, "Typing indicator not sent");
                }
                tokio::time::sleep(interval).await;
            }
        })
    }
}

/// Case-sensitive substring scan, first listed word wins
pub fn keyword_verdict(keywords: &KeywordList, text: &str) -> Verdict {
    match keywords.first_match(text) {
        Some(word) => {
            debug!(keyword = word, "Keyword matched");
            Verdict::spam(format!("matched keyword: {word}"))
        }
        None => Verdict::clean("no keyword matched"),
    }
}
