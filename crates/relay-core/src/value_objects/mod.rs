//! Value objects - immutable types that represent domain concepts

mod bot_rights;
mod ids;
mod verdict;

pub use bot_rights::BotRights;
pub use ids::{ChatId, IdParseError, MessageId, TopicId, UserId};
pub use verdict::Verdict;
