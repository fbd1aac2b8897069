//! Error handling utilities for repositories

use relay_core::error::DomainError;
use sqlx::Error as SqlxError;

/// Convert SQLx error to DomainError
pub fn map_db_error(e: SqlxError) -> DomainError {
    DomainError::DatabaseError(e.to_string())
}

/// Map unique violations to `DomainError::UniqueViolation`, anything else to
/// a database error
pub fn map_write_error(e: SqlxError) -> DomainError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            let constraint = db_err.constraint().unwrap_or("unique").to_string();
            return DomainError::UniqueViolation(constraint);
        }
    }
    DomainError::DatabaseError(e.to_string())
}
