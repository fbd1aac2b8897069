//! Session cache facade
//!
//! Combines the keyed mutex registry, per-user and per-topic scratch state and
//! the flood counter behind one handle shared by all handlers.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use relay_core::{TopicId, UserId};
use tracing::debug;

use super::state::{TopicSession, UserSession};
use crate::flood::FloodCounter;
use crate::locks::{KeyedMutex, UserGuard};

/// Occupancy of the cache, reported by `/info`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub locks: usize,
    pub users: usize,
    pub topics: usize,
    pub flood_queues: usize,
}

#[derive(Debug)]
pub struct SessionCache {
    locks: KeyedMutex,
    users: DashMap<UserId, UserSession>,
    topics: DashMap<TopicId, TopicSession>,
    flood: FloodCounter,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl Default for SessionCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            locks: KeyedMutex::new(),
            users: DashMap::new(),
            topics: DashMap::new(),
            flood: FloodCounter::new(),
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    // === Locks ===

    /// Hold the user's mutex until the guard is dropped
    pub async fn lock(&self, user_id: UserId) -> UserGuard {
        self.locks.lock(user_id).await
    }

    pub fn locks(&self) -> &KeyedMutex {
        &self.locks
    }

    // === User scratch ===

    /// Snapshot of a user's session, created empty on first access
    pub fn user(&self, user_id: UserId) -> UserSession {
        self.users.entry(user_id).or_default().clone()
    }

    /// Mutate a user's session in place
    pub fn update_user<R>(&self, user_id: UserId, f: impl FnOnce(&mut UserSession) -> R) -> R {
        let mut entry = self.users.entry(user_id).or_default();
        f(entry.value_mut())
    }

    pub fn topic_of(&self, user_id: UserId) -> Option<TopicId> {
        self.user(user_id).to_topic
    }

    pub fn set_topic_of(&self, user_id: UserId, topic: TopicId) {
        self.update_user(user_id, |s| s.to_topic = Some(topic));
        debug!(user_id = %user_id, topic = %topic, "Cached user topic");
    }

    pub fn is_verified(&self, user_id: UserId) -> Option<bool> {
        self.user(user_id).verified
    }

    pub fn set_verified(&self, user_id: UserId, verified: bool) {
        self.update_user(user_id, |s| s.verified = Some(verified));
    }

    pub fn is_blocked(&self, user_id: UserId) -> Option<bool> {
        self.user(user_id).blocked
    }

    pub fn set_blocked(&self, user_id: UserId, blocked: bool) {
        self.update_user(user_id, |s| s.blocked = Some(blocked));
        debug!(user_id = %user_id, blocked, "Cached block state");
    }

    pub fn attempts(&self, user_id: UserId) -> u32 {
        self.user(user_id).verify_attempts
    }

    pub fn reset_attempts(&self, user_id: UserId) {
        self.update_user(user_id, |s| s.verify_attempts = 0);
    }

    /// Count one wrong answer and return the new total
    pub fn add_attempt(&self, user_id: UserId) -> u32 {
        self.update_user(user_id, |s| {
            s.verify_attempts = s.verify_attempts.saturating_add(1);
            s.verify_attempts
        })
    }

    // === Topic scratch ===

    pub fn user_of(&self, topic: TopicId) -> Option<UserId> {
        self.topics.get(&topic).and_then(|s| s.to_user)
    }

    pub fn set_user_of(&self, topic: TopicId, user_id: UserId) {
        self.topics.entry(topic).or_default().to_user = Some(user_id);
        debug!(topic = %topic, user_id = %user_id, "Cached topic owner");
    }

    // === Flood ===

    /// Record a message and return the count inside `window`
    pub fn record_message(&self, user_id: UserId, window: Duration) -> usize {
        self.flood.record(user_id, window)
    }

    pub fn flood(&self) -> &FloodCounter {
        &self.flood
    }

    // === Maintenance ===

    /// Wipe user and topic scratch state
    ///
    /// Mutexes and flood queues are left alone; the repository remains
    /// authoritative for anything that was cached.
    pub fn clear_all(&self) {
        let users = self.users.len();
        let topics = self.topics.len();
        self.users.clear();
        self.topics.clear();
        debug!(users, topics, "Session cache cleared");
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            locks: self.locks.len(),
            users: self.users.len(),
            topics: self.topics.len(),
            flood_queues: self.flood.len(),
        }
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn uptime(&self) -> Duration {
        self.started.elapsed()
    }
}
