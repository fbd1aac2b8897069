//! User entity - an end user that passed verification and owns a topic

use chrono::{DateTime, Utc};

use crate::events::UserProfile;
use crate::value_objects::{TopicId, UserId};

/// End user together with the forum thread that mirrors their private chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub full_name: String,
    pub language_code: Option<String>,
    pub is_premium: bool,
    pub topic: TopicId,
    pub first_active_time: DateTime<Utc>,
}

impl User {
    /// Snapshot a profile at the moment its topic was created
    pub fn new(profile: &UserProfile, topic: TopicId) -> Self {
        Self {
            id: profile.id,
            username: profile.username.clone(),
            first_name: profile.first_name.clone(),
            last_name: profile.last_name.clone(),
            full_name: profile.display_name(),
            language_code: profile.language_code.clone(),
            is_premium: profile.is_premium,
            topic,
            first_active_time: Utc::now(),
        }
    }

    /// `@username`, or `None` when the account has no public handle
    pub fn mention(&self) -> Option<String> {
        self.username.as_ref().map(|name| format!("@{name}"))
    }
}
