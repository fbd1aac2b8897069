//! Application error types
//!
//! Errors that reach the process boundary.

use relay_core::DomainError;
use std::fmt;

use crate::config::ConfigError;

/// Application-wide error type
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    // Startup errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    // Infrastructure errors
    #[error("Database error: {0}")]
    Database(String),

    #[error("Messaging gateway error: {0}")]
    Gateway(String),

    // Internal errors
    #[error("Internal error")]
    Internal(#[source] anyhow::Error),

    // Domain errors
    #[error(transparent)]
    Domain(#[from] DomainError),
}

impl AppError {
    /// Get error code for logs
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
            Self::Domain(e) => e.code(),
        }
    }

    /// Create a database error
    #[must_use]
    pub fn database(msg: impl fmt::Display) -> Self {
        Self::Database(msg.to_string())
    }

    /// Create a gateway error
    #[must_use]
    pub fn gateway(msg: impl fmt::Display) -> Self {
        Self::Gateway(msg.to_string())
    }

    /// Create an internal error from any error
    pub fn internal(err: impl Into<anyhow::Error>) -> Self {
        Self::Internal(err.into())
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
