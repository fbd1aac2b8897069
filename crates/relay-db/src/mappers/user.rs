//! User model -> entity mapper

use relay_core::entities::User;
use relay_core::value_objects::{TopicId, UserId};

use crate::models::UserModel;

impl From<UserModel> for User {
    fn from(model: UserModel) -> Self {
        User {
            id: UserId::new(model.userid),
            username: model.username,
            first_name: model.first_name,
            last_name: model.last_name,
            full_name: model.full_name,
            language_code: model.language_code,
            is_premium: model.is_premium,
            topic: TopicId::new(model.topic),
            first_active_time: model.first_active_time,
        }
    }
}
