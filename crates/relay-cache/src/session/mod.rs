//! Session state and the cache facade

mod cache;
mod state;

pub use cache::{CacheStats, SessionCache};
pub use state::{TopicSession, UserSession};
