//! Service context - dependency container for services
//!
//! Holds the repositories, the collaborator ports, the session cache, the
//! classifier rate limiter and the runtime state discovered at startup.

use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use parking_lot::RwLock;
use relay_cache::SessionCache;
use relay_common::AppConfig;
use relay_core::traits::{
    BlockRepository, CaptchaGenerator, Classifier, HealthCheck, MappingRepository,
    MessagingGateway, SettingsRepository, UserRepository, VerificationRepository,
};
use relay_core::{ChatId, ChatKind, IncomingMessage, TopicId, UserId};

use super::error::{ServiceError, ServiceResult};
use super::keywords::KeywordList;

/// Tunables of the relay, resolved from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Forum supergroup where staff answers
    pub staff_chat_id: ChatId,
    /// The only account allowed to run admin commands
    pub admin_id: UserId,
    pub verify_ttl: Duration,
    pub flood_window: Duration,
    pub flood_warn_threshold: usize,
    pub flood_block_threshold: usize,
    pub classify_timeout: Duration,
    pub typing_interval: Duration,
    pub retention_days: u32,
    pub classifier_requests: u32,
    pub classifier_period: Duration,
}

impl RelaySettings {
    /// Settings with the default tunables
    pub fn new(staff_chat_id: ChatId, admin_id: UserId) -> Self {
        Self {
            staff_chat_id,
            admin_id,
            verify_ttl: Duration::from_secs(30),
            flood_window: Duration::from_secs(4),
            flood_warn_threshold: 7,
            flood_block_threshold: 10,
            classify_timeout: Duration::from_secs(40),
            typing_interval: Duration::from_millis(4500),
            retention_days: 2,
            classifier_requests: 5,
            classifier_period: Duration::from_secs(30),
        }
    }
}

impl From<&AppConfig> for RelaySettings {
    fn from(config: &AppConfig) -> Self {
        Self {
            staff_chat_id: ChatId::new(config.telegram.staff_chat_id),
            admin_id: UserId::new(config.telegram.admin_id),
            verify_ttl: config.telegram.verify_ttl(),
            flood_window: config.relay.flood_window(),
            flood_warn_threshold: config.relay.flood_warn_threshold,
            flood_block_threshold: config.relay.flood_block_threshold,
            classify_timeout: config.relay.classify_timeout(),
            typing_interval: config.relay.typing_interval(),
            retention_days: config.relay.retention_days,
            classifier_requests: config.classifier.requests,
            classifier_period: config.classifier.period(),
        }
    }
}

/// Token bucket holding `requests` tokens, refilled over `period`
pub fn classifier_limiter(requests: u32, period: Duration) -> DefaultDirectRateLimiter {
    let burst = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
    let quota = Quota::with_period(period / burst.get())
        .unwrap_or_else(|| Quota::per_second(burst))
        .allow_burst(burst);
    RateLimiter::direct(quota)
}

/// Service context containing all dependencies
///
/// Cheap to clone; every field is shared.
#[derive(Clone)]
pub struct ServiceContext {
    // Repositories
    user_repo: Arc<dyn UserRepository>,
    verification_repo: Arc<dyn VerificationRepository>,
    block_repo: Arc<dyn BlockRepository>,
    mapping_repo: Arc<dyn MappingRepository>,
    settings_repo: Arc<dyn SettingsRepository>,
    health: Arc<dyn HealthCheck>,

    // Collaborators
    gateway: Arc<dyn MessagingGateway>,
    classifier: Arc<dyn Classifier>,
    captcha: Arc<dyn CaptchaGenerator>,

    // Session state
    cache: Arc<SessionCache>,
    limiter: Arc<DefaultDirectRateLimiter>,
    keywords: Arc<KeywordList>,

    settings: RelaySettings,

    // Discovered at startup
    spam_topic: Arc<RwLock<Option<TopicId>>>,
    ready: Arc<AtomicBool>,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::new()
    }

    // === Repositories ===

    pub fn user_repo(&self) -> &dyn UserRepository {
        self.user_repo.as_ref()
    }

    pub fn verification_repo(&self) -> &dyn VerificationRepository {
        self.verification_repo.as_ref()
    }

    pub fn block_repo(&self) -> &dyn BlockRepository {
        self.block_repo.as_ref()
    }

    pub fn mapping_repo(&self) -> &dyn MappingRepository {
        self.mapping_repo.as_ref()
    }

    pub fn settings_repo(&self) -> &dyn SettingsRepository {
        self.settings_repo.as_ref()
    }

    pub fn health(&self) -> &dyn HealthCheck {
        self.health.as_ref()
    }

    // === Collaborators ===

    pub fn gateway(&self) -> &dyn MessagingGateway {
        self.gateway.as_ref()
    }

    /// Shared handle for tasks that outlive the borrow
    pub fn gateway_handle(&self) -> Arc<dyn MessagingGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }

    pub fn captcha(&self) -> Arc<dyn CaptchaGenerator> {
        Arc::clone(&self.captcha)
    }

    // === Session state ===

    pub fn cache(&self) -> &SessionCache {
        self.cache.as_ref()
    }

    pub fn limiter(&self) -> &DefaultDirectRateLimiter {
        self.limiter.as_ref()
    }

    pub fn keywords(&self) -> &KeywordList {
        self.keywords.as_ref()
    }

    pub fn settings(&self) -> &RelaySettings {
        &self.settings
    }

    #[inline]
    pub fn staff_chat_id(&self) -> ChatId {
        self.settings.staff_chat_id
    }

    #[inline]
    pub fn admin_id(&self) -> UserId {
        self.settings.admin_id
    }

    /// A message from the admin inside the staff forum supergroup
    pub fn is_staff_forum_admin(&self, msg: &IncomingMessage) -> bool {
        msg.chat.kind == ChatKind::Supergroup
            && msg.chat.id == self.settings.staff_chat_id
            && msg.sender_id() == Some(self.settings.admin_id)
            && msg.chat.is_forum
    }

    // === Runtime state ===

    /// Thread that collects messages flagged as spam
    pub fn spam_topic(&self) -> Option<TopicId> {
        *self.spam_topic.read()
    }

    pub fn set_spam_topic(&self, topic: Option<TopicId>) {
        *self.spam_topic.write() = topic;
    }

    /// Whether the last self-test passed
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::Release);
    }
}

impl std::fmt::Debug for ServiceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContext")
            .field("repositories", &self.health.backend())
            .field("classifier_configured", &self.classifier.is_configured())
            .field("keywords", &self.keywords.len())
            .field("settings", &self.settings)
            .field("spam_topic", &self.spam_topic())
            .field("ready", &self.is_ready())
            .finish_non_exhaustive()
    }
}

/// Builder for creating ServiceContext
#[derive(Default)]
pub struct ServiceContextBuilder {
    user_repo: Option<Arc<dyn UserRepository>>,
    verification_repo: Option<Arc<dyn VerificationRepository>>,
    block_repo: Option<Arc<dyn BlockRepository>>,
    mapping_repo: Option<Arc<dyn MappingRepository>>,
    settings_repo: Option<Arc<dyn SettingsRepository>>,
    health: Option<Arc<dyn HealthCheck>>,
    gateway: Option<Arc<dyn MessagingGateway>>,
    classifier: Option<Arc<dyn Classifier>>,
    captcha: Option<Arc<dyn CaptchaGenerator>>,
    cache: Option<Arc<SessionCache>>,
    keywords: Option<KeywordList>,
    settings: Option<RelaySettings>,
}

impl ServiceContextBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user_repo(mut self, repo: Arc<dyn UserRepository>) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn verification_repo(mut self, repo: Arc<dyn VerificationRepository>) -> Self {
        self.verification_repo = Some(repo);
        self
    }

    pub fn block_repo(mut self, repo: Arc<dyn BlockRepository>) -> Self {
        self.block_repo = Some(repo);
        self
    }

    pub fn mapping_repo(mut self, repo: Arc<dyn MappingRepository>) -> Self {
        self.mapping_repo = Some(repo);
        self
    }

    pub fn settings_repo(mut self, repo: Arc<dyn SettingsRepository>) -> Self {
        self.settings_repo = Some(repo);
        self
    }

    pub fn health(mut self, health: Arc<dyn HealthCheck>) -> Self {
        self.health = Some(health);
        self
    }

    pub fn gateway(mut self, gateway: Arc<dyn MessagingGateway>) -> Self {
        self.gateway = Some(gateway);
        self
    }

    pub fn classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn captcha(mut self, captcha: Arc<dyn CaptchaGenerator>) -> Self {
        self.captcha = Some(captcha);
        self
    }

    /// Share an existing cache; a fresh one is created otherwise
    pub fn cache(mut self, cache: Arc<SessionCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Override the embedded prohibited-word list
    pub fn keywords(mut self, keywords: KeywordList) -> Self {
        self.keywords = Some(keywords);
        self
    }

    pub fn settings(mut self, settings: RelaySettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Build the ServiceContext
    ///
    /// # Errors
    /// Returns `ServiceError::Validation` if any required dependency is missing
    pub fn build(self) -> ServiceResult<ServiceContext> {
        let settings = self.settings.ok_or_else(|| required("settings"))?;
        let limiter = classifier_limiter(settings.classifier_requests, settings.classifier_period);

        Ok(ServiceContext {
            user_repo: self.user_repo.ok_or_else(|| required("user_repo"))?,
            verification_repo: self
                .verification_repo
                .ok_or_else(|| required("verification_repo"))?,
            block_repo: self.block_repo.ok_or_else(|| required("block_repo"))?,
            mapping_repo: self.mapping_repo.ok_or_else(|| required("mapping_repo"))?,
            settings_repo: self.settings_repo.ok_or_else(|| required("settings_repo"))?,
            health: self.health.ok_or_else(|| required("health"))?,
            gateway: self.gateway.ok_or_else(|| required("gateway"))?,
            classifier: self.classifier.ok_or_else(|| required("classifier"))?,
            captcha: self.captcha.ok_or_else(|| required("captcha"))?,
            cache: self.cache.unwrap_or_default(),
            limiter: Arc::new(limiter),
            keywords: Arc::new(self.keywords.unwrap_or_else(KeywordList::embedded)),
            settings,
            spam_topic: Arc::new(RwLock::new(None)),
            ready: Arc::new(AtomicBool::new(false)),
        })
    }
}

fn required(name: &str) -> ServiceError {
    ServiceError::validation(format!("{name} is required"))
}
