//! User database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for users table
#[derive(Debug, Clone, FromRow)]
pub struct UserModel {
    pub userid: i64,
    pub username: Option<String>,
    pub first_name: String,
    pub last_name: Option<String>,
    pub full_name: String,
    pub language_code: Option<String>,
    pub is_premium: bool,
    pub topic: i64,
    pub first_active_time: DateTime<Utc>,
}
