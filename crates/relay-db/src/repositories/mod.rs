//! Repository implementations
//!
//! PostgreSQL implementations of the repository traits defined in relay-core.

mod block;
mod error;
mod health;
mod mapping;
mod settings;
mod user;
mod verification;

pub use block::PgBlockRepository;
pub use health::PgHealthCheck;
pub use mapping::PgMappingRepository;
pub use settings::PgSettingsRepository;
pub use user::PgUserRepository;
pub use verification::PgVerificationRepository;
