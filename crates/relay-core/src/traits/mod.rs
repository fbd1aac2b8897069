//! Ports implemented by infrastructure crates

mod ports;
mod repositories;

pub use ports::{
    BotCommand, BotIdentity, Captcha, CaptchaError, CaptchaGenerator, ChatInfo, Classifier,
    ClassifierError, GatewayError, GatewayResult, MemberInfo, MemberStatus, MessagingGateway,
    OutgoingText,
};
pub use repositories::{
    BlockRepository, HealthCheck, MappingRepository, RepoResult, SettingsRepository,
    UserRepository, VerificationRepository,
};
