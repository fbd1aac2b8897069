//! # relay-service
//!
//! Application layer containing the relay engine and everything around it:
//! the verification gate, spam moderation, admin commands, diagnostics, the
//! ordered route table, the startup self-test and the periodic jobs.
//!
//! All collaborators are reached through the ports of `relay-core`, so the
//! crate can be exercised end to end with in-memory doubles.

pub mod dispatcher;
pub mod jobs;
pub mod services;

pub use dispatcher::{Dispatcher, Route};
pub use jobs::{Job, Scheduler, SelfTest, SelfTestReport};
pub use services::{
    AdminService, InfoService, ModerationService, RelayService, RelaySettings, ServiceContext,
    ServiceContextBuilder, ServiceError, ServiceResult, VerificationService,
};
