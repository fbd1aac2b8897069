//! Verification database model

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database model for verifications table
#[derive(Debug, Clone, FromRow)]
pub struct VerificationModel {
    pub userid: i64,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub verified: bool,
}
