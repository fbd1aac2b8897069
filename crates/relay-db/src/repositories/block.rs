//! PostgreSQL implementation of BlockRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::BlockRecord;
use relay_core::traits::{BlockRepository, RepoResult};
use relay_core::value_objects::UserId;

use crate::models::BlockModel;

use super::error::map_db_error;

/// PostgreSQL implementation of BlockRepository
#[derive(Clone)]
pub struct PgBlockRepository {
    pool: PgPool,
}

impl PgBlockRepository {
    /// Create a new PgBlockRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BlockRepository for PgBlockRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: UserId) -> RepoResult<Option<BlockRecord>> {
        let result = sqlx::query_as::<_, BlockModel>(
            r"
            SELECT userid, pinned_message_id, created_at
            FROM blocks
            WHERE userid = $1
            ",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(BlockRecord::from))
    }

    #[instrument(skip(self))]
    async fn is_blocked(&self, user_id: UserId) -> RepoResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM blocks WHERE userid = $1)
            ",
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn create(&self, record: &BlockRecord) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO blocks (userid, pinned_message_id, created_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (userid) DO UPDATE
            SET pinned_message_id = COALESCE(blocks.pinned_message_id, EXCLUDED.pinned_message_id)
            ",
        )
        .bind(record.user_id.into_inner())
        .bind(record.pinned_message_id.map(|id| id.into_inner()))
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: UserId) -> RepoResult<bool> {
        let result = sqlx::query(r"DELETE FROM blocks WHERE userid = $1")
            .bind(user_id.into_inner())
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn count(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM blocks")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count)
    }
}
