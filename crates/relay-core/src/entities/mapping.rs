//! Message mapping - identity of one message on both sides of the relay

use chrono::{DateTime, Utc};

use crate::value_objects::{MessageId, UserId, Verdict};

/// Association between a private message and its copy in the staff group
///
/// Unique on `(user_id, private_message_id)` and, independently, on
/// `topic_message_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageMapping {
    pub user_id: UserId,
    pub private_message_id: MessageId,
    pub topic_message_id: MessageId,
    pub spam: bool,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}

impl MessageMapping {
    pub fn new(
        user_id: UserId,
        private_message_id: MessageId,
        topic_message_id: MessageId,
        verdict: &Verdict,
    ) -> Self {
        Self {
            user_id,
            private_message_id,
            topic_message_id,
            spam: verdict.is_spam,
            reason: verdict.reason.clone(),
            created_at: Utc::now(),
        }
    }

    /// Mapping for a message written by staff in the user's topic
    pub fn from_staff(
        user_id: UserId,
        private_message_id: MessageId,
        topic_message_id: MessageId,
    ) -> Self {
        Self::new(
            user_id,
            private_message_id,
            topic_message_id,
            &Verdict::clean(STAFF_MESSAGE_REASON),
        )
    }

    /// Whether two mappings describe the same logical message
    pub fn same_message(&self, other: &MessageMapping) -> bool {
        self.user_id == other.user_id
            && self.private_message_id == other.private_message_id
            && self.topic_message_id == other.topic_message_id
    }
}

/// Reason stored for messages relayed from staff to a user
pub const STAFF_MESSAGE_REASON: &str = "staff message";
