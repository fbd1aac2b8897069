//! Block record - a user that may no longer reach the staff group

use chrono::{DateTime, Utc};

use crate::value_objects::{MessageId, UserId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockRecord {
    pub user_id: UserId,
    /// Announcement pinned in the user's topic, set only for admin bans
    pub pinned_message_id: Option<MessageId>,
    pub created_at: DateTime<Utc>,
}

impl BlockRecord {
    /// Automatic block (failed verification, flood)
    pub fn automatic(user_id: UserId) -> Self {
        Self {
            user_id,
            pinned_message_id: None,
            created_at: Utc::now(),
        }
    }

    /// Admin ban announced by a pinned message
    pub fn with_announcement(user_id: UserId, pinned: MessageId) -> Self {
        Self {
            user_id,
            pinned_message_id: Some(pinned),
            created_at: Utc::now(),
        }
    }
}
