//! Block model -> entity mapper

use relay_core::entities::BlockRecord;
use relay_core::value_objects::{MessageId, UserId};

use crate::models::BlockModel;

impl From<BlockModel> for BlockRecord {
    fn from(model: BlockModel) -> Self {
        BlockRecord {
            user_id: UserId::new(model.userid),
            pinned_message_id: model.pinned_message_id.map(MessageId::new),
            created_at: model.created_at,
        }
    }
}
