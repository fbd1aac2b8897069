//! Message mapping database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for message_mappings table
#[derive(Debug, Clone, FromRow)]
pub struct MessageMappingModel {
    pub id: i64,
    pub userid: i64,
    pub private_message_id: i64,
    pub topic_message_id: i64,
    pub spam: bool,
    pub reason: String,
    pub created_at: DateTime<Utc>,
}
