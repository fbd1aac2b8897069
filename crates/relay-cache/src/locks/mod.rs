//! Per-user mutex registry

mod keyed_mutex;

pub use keyed_mutex::{KeyedMutex, UserGuard};
