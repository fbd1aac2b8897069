//! Verification record - the durable half of the challenge state machine
//!
//! The attempt counter is intentionally not part of this record; it lives in
//! the session cache only.

use chrono::{DateTime, Duration, Utc};

use crate::value_objects::UserId;

/// Challenge issued to a user and whether it was solved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerificationRecord {
    pub user_id: UserId,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}

impl VerificationRecord {
    /// Fresh, unsolved challenge valid for `ttl`
    pub fn issue(user_id: UserId, code: impl Into<String>, ttl: Duration) -> Self {
        Self {
            user_id,
            code: code.into(),
            expires_at: Utc::now() + ttl,
            verified: false,
        }
    }

    #[inline]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at < now
    }

    #[inline]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Case-insensitive comparison of a submitted answer
    pub fn matches(&self, answer: &str) -> bool {
        answer.trim().to_uppercase() == self.code
    }
}
