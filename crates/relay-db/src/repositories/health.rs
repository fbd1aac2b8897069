//! Database health check

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::traits::{HealthCheck, RepoResult};

use super::error::map_db_error;

#[derive(Clone)]
pub struct PgHealthCheck {
    pool: PgPool,
}

impl PgHealthCheck {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HealthCheck for PgHealthCheck {
    #[instrument(skip(self))]
    async fn ping(&self) -> RepoResult<()> {
        sqlx::query_scalar::<_, i32>(r"SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgresql"
    }
}
