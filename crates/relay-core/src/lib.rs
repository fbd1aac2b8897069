//! # relay-core
//!
//! Domain layer containing entities, value objects, the inbound update model,
//! repository traits and the ports for the messaging gateway, the spam
//! classifier and the captcha generator.
//! This crate has zero dependencies on infrastructure (database, HTTP, etc.).

pub mod entities;
pub mod error;
pub mod events;
pub mod traits;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    BlockRecord, MessageMapping, RuntimeSetting, User, VerificationRecord, SPAM_TOPIC_KEY,
    STAFF_MESSAGE_REASON,
};
pub use error::DomainError;
pub use events::{
    Chat, ChatKind, Command, IncomingMessage, ReactionKind, ReactionUpdate, Update, UserProfile,
};
pub use traits::{
    BlockRepository, BotCommand, BotIdentity, Captcha, CaptchaError, CaptchaGenerator, ChatInfo,
    Classifier, ClassifierError, GatewayError, GatewayResult, HealthCheck, MappingRepository,
    MemberInfo, MemberStatus, MessagingGateway, OutgoingText, RepoResult, SettingsRepository,
    UserRepository, VerificationRepository,
};
pub use value_objects::{BotRights, ChatId, IdParseError, MessageId, TopicId, UserId, Verdict};
