//! Database models - SQLx-compatible structs for PostgreSQL tables

mod block;
mod mapping;
mod user;
mod verification;

pub use block::BlockModel;
pub use mapping::MessageMappingModel;
pub use user::UserModel;
pub use verification::VerificationModel;
