//! PostgreSQL implementation of VerificationRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::VerificationRecord;
use relay_core::traits::{RepoResult, VerificationRepository};
use relay_core::value_objects::UserId;

use crate::models::VerificationModel;

use super::error::map_db_error;

/// PostgreSQL implementation of VerificationRepository
#[derive(Clone)]
pub struct PgVerificationRepository {
    pool: PgPool,
}

impl PgVerificationRepository {
    /// Create a new PgVerificationRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VerificationRepository for PgVerificationRepository {
    #[instrument(skip(self))]
    async fn find(&self, user_id: UserId) -> RepoResult<Option<VerificationRecord>> {
        let result = sqlx::query_as::<_, VerificationModel>(
            r"
            SELECT userid, code, expires_at, verified
            FROM verifications
            WHERE userid = $1
            ",
        )
        .bind(user_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(VerificationRecord::from))
    }

    // The code is a secret; keep it out of the span
    #[instrument(skip(self, record), fields(user_id = %record.user_id))]
    async fn upsert(&self, record: &VerificationRecord) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO verifications (userid, code, expires_at, verified)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (userid) DO UPDATE
            SET code = EXCLUDED.code,
                expires_at = EXCLUDED.expires_at,
                verified = EXCLUDED.verified
            ",
        )
        .bind(record.user_id.into_inner())
        .bind(&record.code)
        .bind(record.expires_at)
        .bind(record.verified)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn set_verified(&self, user_id: UserId, verified: bool) -> RepoResult<()> {
        sqlx::query(r"UPDATE verifications SET verified = $2 WHERE userid = $1")
            .bind(user_id.into_inner())
            .bind(verified)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn is_verified(&self, user_id: UserId) -> RepoResult<bool> {
        let result = sqlx::query_scalar::<_, bool>(
            r"
            SELECT EXISTS(SELECT 1 FROM verifications WHERE userid = $1 AND verified)
            ",
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result)
    }

    #[instrument(skip(self))]
    async fn count_verified(&self) -> RepoResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM verifications WHERE verified")
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(count)
    }
}
