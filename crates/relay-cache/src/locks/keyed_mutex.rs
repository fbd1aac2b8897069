//! Keyed mutex registry
//!
//! Uses `DashMap::entry` so that two tasks asking for the same user's mutex
//! at the same time always receive the same instance.

use std::sync::Arc;

use dashmap::DashMap;
use relay_core::UserId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Proof that the caller holds a user's mutex
///
/// Released on drop.
#[derive(Debug)]
pub struct UserGuard {
    user_id: UserId,
    _guard: OwnedMutexGuard<()>,
}

impl UserGuard {
    #[inline]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }
}

/// Registry of per-user async mutexes, created on first access
#[derive(Debug, Default)]
pub struct KeyedMutex {
    locks: DashMap<UserId, Arc<Mutex<()>>>,
}

impl KeyedMutex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The mutex for `user_id`, inserting it if absent
    pub fn lock_for(&self, user_id: UserId) -> Arc<Mutex<()>> {
        self.locks.entry(user_id).or_default().clone()
    }

    /// Wait for and hold the mutex for `user_id`
    pub async fn lock(&self, user_id: UserId) -> UserGuard {
        let mutex = self.lock_for(user_id);
        let guard = mutex.lock_owned().await;
        UserGuard {
            user_id,
            _guard: guard,
        }
    }

    /// Hold the mutex only if it is free right now
    pub fn try_lock(&self, user_id: UserId) -> Option<UserGuard> {
        let mutex = self.lock_for(user_id);
        mutex.try_lock_owned().ok().map(|guard| UserGuard {
            user_id,
            _guard: guard,
        })
    }

    /// Drop mutexes nobody holds or waits on, returning how many were removed
    ///
    /// An entry is idle when the registry owns the only reference. Holders and
    /// waiters keep a clone, so their mutex survives.
    pub fn prune_idle(&self) -> usize {
        let before = self.locks.len();
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
        before.saturating_sub(self.locks.len())
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
