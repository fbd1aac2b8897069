//! # relay-db
//!
//! Database layer implementing repository traits with PostgreSQL via SQLx.
//!
//! ## Overview
//!
//! This crate provides PostgreSQL implementations for all repository traits
//! defined in `relay-core`. It handles:
//!
//! - Connection pool management and schema setup
//! - Database models with SQLx `FromRow` derives
//! - Model → entity mappers
//! - Repository implementations
//!
//! Unique violations surface as `DomainError::UniqueViolation` so callers can
//! treat duplicate inserts as idempotent retries.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use relay_db::{create_pool, run_migrations, DatabaseConfig, PgMappingRepository};
//!
//! async fn example() -> Result<(), Box<dyn std::error::Error>> {
//!     let pool = create_pool(&DatabaseConfig::default()).await?;
//!     run_migrations(&pool).await?;
//!     let mappings = PgMappingRepository::new(pool);
//!     Ok(())
//! }
//! ```

pub mod mappers;
pub mod models;
pub mod pool;
pub mod repositories;

// Re-export commonly used types
pub use pool::{create_pool, run_migrations, DatabaseConfig, PgPool};
pub use repositories::{
    PgBlockRepository, PgHealthCheck, PgMappingRepository, PgSettingsRepository,
    PgUserRepository, PgVerificationRepository,
};
