//! Service layer error types
//!
//! Provides a unified error type for all service operations.

use std::fmt;

use relay_common::AppError;
use relay_core::{CaptchaError, ClassifierError, DomainError, GatewayError};

/// Service layer error type
#[derive(Debug)]
pub enum ServiceError {
    /// Repository or domain rule failure
    Domain(DomainError),

    /// Messaging gateway failure
    Gateway(GatewayError),

    /// Classifier failure that must not be masked by the keyword fallback
    Classifier(ClassifierError),

    /// Captcha rendering failed
    Captcha(CaptchaError),

    /// A mapping insert conflicted but neither unique key finds the row
    FatalConsistency(String),

    /// The user's topic could not be created or resolved
    TopicUnavailable(String),

    /// Validation error
    Validation(String),

    /// Internal error
    Internal(String),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Domain(e) => write!(f, "{e}"),
            Self::Gateway(e) => write!(f, "Gateway error: {e}"),
            Self::Classifier(e) => write!(f, "{e}"),
            Self::Captcha(e) => write!(f, "{e}"),
            Self::FatalConsistency(msg) => write!(f, "Fatal consistency error: {msg}"),
            Self::TopicUnavailable(msg) => write!(f, "Topic unavailable: {msg}"),
            Self::Validation(msg) => write!(f, "Validation error: {msg}"),
            Self::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Domain(e) => Some(e),
            Self::Gateway(e) => Some(e),
            Self::Classifier(e) => Some(e),
            Self::Captcha(e) => Some(e),
            _ => None,
        }
    }
}

impl ServiceError {
    /// Create a fatal consistency error
    pub fn fatal_consistency(msg: impl Into<String>) -> Self {
        Self::FatalConsistency(msg.into())
    }

    /// Create a topic unavailable error
    pub fn topic_unavailable(msg: impl Into<String>) -> Self {
        Self::TopicUnavailable(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Get the error code for diagnostics
    pub fn error_code(&self) -> &str {
        match self {
            Self::Domain(e) => e.code(),
            Self::Gateway(GatewayError::TimedOut) => "GATEWAY_TIMEOUT",
            Self::Gateway(GatewayError::Forbidden(_)) => "RECIPIENT_UNREACHABLE",
            Self::Gateway(_) => "GATEWAY_ERROR",
            Self::Classifier(_) => "CLASSIFIER_UNKNOWN_FAILURE",
            Self::Captcha(_) => "CAPTCHA_ERROR",
            Self::FatalConsistency(_) => "FATAL_CONSISTENCY",
            Self::TopicUnavailable(_) => "TOPIC_UNAVAILABLE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        Self::Domain(err)
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        Self::Gateway(err)
    }
}

impl From<ClassifierError> for ServiceError {
    fn from(err: ClassifierError) -> Self {
        Self::Classifier(err)
    }
}

impl From<CaptchaError> for ServiceError {
    fn from(err: CaptchaError) -> Self {
        Self::Captcha(err)
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Domain(e) => AppError::Domain(e),
            ServiceError::Gateway(e) => AppError::gateway(e.to_string()),
            other => AppError::internal(other),
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
