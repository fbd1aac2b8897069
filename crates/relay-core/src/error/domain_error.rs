//! Domain errors raised by repository implementations

use thiserror::Error;

/// Repository failures as seen by the relay
#[derive(Debug, Error)]
pub enum DomainError {
    /// A unique constraint rejected the write; the payload names the constraint
    ///
    /// Mapping inserts treat this as a possibly lost duplicate race.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl DomainError {
    /// Stable error code for logs
    pub fn code(&self) -> &'static str {
        match self {
            Self::UniqueViolation(_) => "UNIQUE_VIOLATION",
            Self::DatabaseError(_) => "DATABASE_ERROR",
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }
}
