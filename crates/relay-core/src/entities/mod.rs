//! Domain entities - core business objects

mod block;
mod mapping;
mod setting;
mod user;
mod verification;

pub use block::BlockRecord;
pub use mapping::{MessageMapping, STAFF_MESSAGE_REASON};
pub use setting::{RuntimeSetting, SPAM_TOPIC_KEY};
pub use user::User;
pub use verification::VerificationRecord;
