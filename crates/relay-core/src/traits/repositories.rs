//! Repository traits (ports) - define the interface for data access
//!
//! Every implementation must be safe under concurrent calls for different
//! users. Serialization for a single user is the caller's job (per-user mutex).

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::entities::{BlockRecord, MessageMapping, RuntimeSetting, User, VerificationRecord};
use crate::error::DomainError;
use crate::value_objects::{MessageId, TopicId, UserId};

/// Result type for repository operations
pub type RepoResult<T> = Result<T, DomainError>;

// ============================================================================
// User Repository
// ============================================================================

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>>;

    /// Find the user owning a forum topic
    async fn find_by_topic(&self, topic: TopicId) -> RepoResult<Option<User>>;

    /// Insert a user
    ///
    /// Fails with `DomainError::UniqueViolation` if the user or the topic is
    /// already taken.
    async fn create(&self, user: &User) -> RepoResult<()>;

    /// Number of users that own a topic
    async fn count_topics(&self) -> RepoResult<i64>;
}

// ============================================================================
// Verification Repository
// ============================================================================

#[async_trait]
pub trait VerificationRepository: Send + Sync {
    /// Current challenge for a user
    async fn find(&self, user_id: UserId) -> RepoResult<Option<VerificationRecord>>;

    /// Insert or replace the challenge for `record.user_id`
    async fn upsert(&self, record: &VerificationRecord) -> RepoResult<()>;

    /// Set the verified flag; a no-op when the user has no record
    async fn set_verified(&self, user_id: UserId, verified: bool) -> RepoResult<()>;

    /// Whether the user solved (or was granted) verification
    async fn is_verified(&self, user_id: UserId) -> RepoResult<bool> {
        Ok(self.find(user_id).await?.is_some_and(|r| r.verified))
    }

    /// Number of verified users
    async fn count_verified(&self) -> RepoResult<i64>;
}

// ============================================================================
// Block Repository
// ============================================================================

#[async_trait]
pub trait BlockRepository: Send + Sync {
    /// Block record for a user
    async fn find(&self, user_id: UserId) -> RepoResult<Option<BlockRecord>>;

    /// Whether the user is blocked
    async fn is_blocked(&self, user_id: UserId) -> RepoResult<bool> {
        Ok(self.find(user_id).await?.is_some())
    }

    /// Insert a block
    ///
    /// If the user is already blocked without an announcement, the pinned
    /// message id of `record` is attached to the existing row.
    async fn create(&self, record: &BlockRecord) -> RepoResult<()>;

    /// Remove a block, returning whether a row existed
    async fn delete(&self, user_id: UserId) -> RepoResult<bool>;

    /// Number of blocked users
    async fn count(&self) -> RepoResult<i64>;
}

// ============================================================================
// Mapping Repository
// ============================================================================

#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Insert a mapping
    ///
    /// Fails with `DomainError::UniqueViolation` if either unique key is taken.
    async fn insert(&self, mapping: &MessageMapping) -> RepoResult<()>;

    /// Find by the id of the copy in the staff group
    async fn find_by_topic_message(
        &self,
        topic_message_id: MessageId,
    ) -> RepoResult<Option<MessageMapping>>;

    /// Find by the id of the message in the user's private chat
    async fn find_by_private(
        &self,
        user_id: UserId,
        private_message_id: MessageId,
    ) -> RepoResult<Option<MessageMapping>>;

    /// Delete one mapping, returning whether a row existed
    async fn delete(&self, mapping: &MessageMapping) -> RepoResult<bool>;

    /// Delete every mapping created before `cutoff`
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;

    /// Total number of mappings
    async fn count_total(&self) -> RepoResult<i64>;

    /// Number of mappings flagged as spam
    async fn count_spam(&self) -> RepoResult<i64>;

    /// Number of mappings belonging to one user
    async fn count_by_user(&self, user_id: UserId) -> RepoResult<i64>;
}

// ============================================================================
// Settings Repository
// ============================================================================

#[async_trait]
pub trait SettingsRepository: Send + Sync {
    /// Value of a named setting
    async fn get(&self, key: &str) -> RepoResult<Option<String>>;

    /// Insert a setting; an existing key keeps its value
    async fn insert(&self, setting: &RuntimeSetting) -> RepoResult<()>;

    /// Remove a setting
    async fn delete(&self, key: &str) -> RepoResult<()>;
}

// ============================================================================
// Health Check
// ============================================================================

#[async_trait]
pub trait HealthCheck: Send + Sync {
    /// Round-trip to the backend
    async fn ping(&self) -> RepoResult<()>;

    /// Backend name for diagnostics
    fn backend(&self) -> &'static str;
}
