//! Message mapping model -> entity mapper

use relay_core::entities::MessageMapping;
use relay_core::value_objects::{MessageId, UserId};

use crate::models::MessageMappingModel;

impl From<MessageMappingModel> for MessageMapping {
    fn from(model: MessageMappingModel) -> Self {
        MessageMapping {
            user_id: UserId::new(model.userid),
            private_message_id: MessageId::new(model.private_message_id),
            topic_message_id: MessageId::new(model.topic_message_id),
            spam: model.spam,
            reason: model.reason,
            created_at: model.created_at,
        }
    }
}
