//! Block database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for blocks table
#[derive(Debug, Clone, FromRow)]
pub struct BlockModel {
    pub userid: i64,
    pub pinned_message_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}
