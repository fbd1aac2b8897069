//! Typed session scratch state

use relay_core::{TopicId, UserId};

/// Cached facts about one user
///
/// `None` means "unknown, ask the repository".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserSession {
    pub to_topic: Option<TopicId>,
    pub verified: Option<bool>,
    /// Wrong challenge answers in the current cycle; never persisted
    pub verify_attempts: u32,
    pub blocked: Option<bool>,
}

/// Cached facts about one forum topic
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicSession {
    pub to_user: Option<UserId>,
}
