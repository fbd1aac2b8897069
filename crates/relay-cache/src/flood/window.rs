//! Sliding-window message counter
//!
//! Timestamps come from the monotonic `tokio::time::Instant`, which is immune
//! to wall-clock changes. Each timestamp is pushed once and popped at most
//! once, so recording is amortized O(1).

use std::collections::VecDeque;
use std::time::Duration;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use relay_core::UserId;
use tokio::time::Instant;

#[derive(Debug, Default)]
pub struct FloodCounter {
    queues: DashMap<UserId, VecDeque<Instant>>,
}

impl FloodCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one message and return how many fall inside `window`
    ///
    /// A zero window disables counting and always returns 0.
    pub fn record(&self, user_id: UserId, window: Duration) -> usize {
        if window.is_zero() {
            return 0;
        }
        let now = Instant::now();

        match self.queues.entry(user_id) {
            Entry::Occupied(mut entry) => {
                let queue = entry.get_mut();
                queue.push_back(now);
                evict_expired(queue, now, window);
                let count = queue.len();
                if count == 0 {
                    entry.remove();
                }
                count
            }
            Entry::Vacant(entry) => {
                entry.insert(VecDeque::from([now]));
                1
            }
        }
    }

    /// Drop expired timestamps of every user and remove emptied queues
    pub fn sweep(&self, window: Duration) -> usize {
        let now = Instant::now();
        let before = self.queues.len();
        self.queues.retain(|_, queue| {
            evict_expired(queue, now, window);
            !queue.is_empty()
        });
        before.saturating_sub(self.queues.len())
    }

    /// Number of users with a live queue
    pub fn len(&self) -> usize {
        self.queues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queues.is_empty()
    }
}

fn evict_expired(queue: &mut VecDeque<Instant>, now: Instant, window: Duration) {
    while let Some(&oldest) = queue.front() {
        if now.duration_since(oldest) > window {
            queue.pop_front();
        } else {
            break;
        }
    }
}
