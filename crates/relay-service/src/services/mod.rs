//! Business logic services
//!
//! Every service borrows the shared `ServiceContext`; per-user pipelines
//! serialize on the user's mutex from the session cache.

pub mod admin;
pub mod context;
pub mod error;
pub mod help;
pub mod info;
pub mod keywords;
pub mod moderation;
pub mod relay;
pub mod verification;

pub use admin::AdminService;
pub use context::{RelaySettings, ServiceContext, ServiceContextBuilder};
pub use error::{ServiceError, ServiceResult};
pub use info::InfoService;
pub use keywords::KeywordList;
pub use moderation::ModerationService;
pub use relay::RelayService;
pub use verification::VerificationService;
