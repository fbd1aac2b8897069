//! # relay-cache
//!
//! Best-effort, in-process session state. The repository stays the source of
//! truth; everything here may be cleared at any time.
//!
//! ## Features
//!
//! - **Keyed mutexes**: one lazily created async mutex per user
//! - **Session scratch**: typed per-user and per-topic state
//! - **Flood window**: sliding-window message counter per user
//!
//! ## Example
//!
//! ```ignore
//! use relay_cache::SessionCache;
//!
//! let cache = SessionCache::new();
//! let guard = cache.lock(user_id).await;
//! let count = cache.record_message(user_id, Duration::from_secs(4));
//! cache.set_blocked(user_id, true);
//! drop(guard);
//! ```

pub mod flood;
pub mod locks;
pub mod session;

pub use flood::FloodCounter;
pub use locks::{KeyedMutex, UserGuard};
pub use session::{CacheStats, SessionCache, TopicSession, UserSession};
