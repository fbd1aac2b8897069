//! PostgreSQL implementation of MappingRepository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::MessageMapping;
use relay_core::traits::{MappingRepository, RepoResult};
use relay_core::value_objects::{MessageId, UserId};

use crate::models::MessageMappingModel;

use super::error::{map_db_error, map_write_error};

/// PostgreSQL implementation of MappingRepository
#[derive(Clone)]
pub struct PgMappingRepository {
    pool: PgPool,
}

impl PgMappingRepository {
    /// Create a new PgMappingRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingRepository for PgMappingRepository {
    #[instrument(skip(self, mapping), fields(
        user_id = %mapping.user_id,
        private_message_id = %mapping.private_message_id,
        topic_message_id = %mapping.topic_message_id,
    ))]
    async fn insert(&self, mapping: &MessageMapping) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO message_mappings
                (userid, private_message_id, topic_message_id, spam, reason, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            ",
        )
        .bind(mapping.user_id.into_inner())
        .bind(mapping.private_message_id.into_inner())
        .bind(mapping.topic_message_id.into_inner())
        .bind(mapping.spam)
        .bind(&mapping.reason)
        .bind(mapping.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_topic_message(
        &self,
        topic_message_id: MessageId,
    ) -> RepoResult<Option<MessageMapping>> {
        let result = sqlx::query_as::<_, MessageMappingModel>(
            r"
            SELECT id, userid, private_message_id, topic_message_id, spam, reason, created_at
            FROM message_mappings
            WHERE topic_message_id = $1
            ",
        )
        .bind(topic_message_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(MessageMapping::from))
    }

    #[instrument(skip(self))]
    async fn find_by_private(
        &self,
        user_id: UserId,
        private_message_id: MessageId,
    ) -> RepoResult<Option<MessageMapping>> {
        let result = sqlx::query_as::<_, MessageMappingModel>(
            r"
            SELECT id, userid, private_message_id, topic_message_id, spam, reason, created_at
            FROM message_mappings
            WHERE userid = $1 AND private_message_id = $2
            ",
        )
        .bind(user_id.into_inner())
        .bind(private_message_id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(MessageMapping::from))
    }

    #[instrument(skip(self, mapping), fields(topic_message_id = %mapping.topic_message_id))]
    async fn delete(&self, mapping: &MessageMapping) -> RepoResult<bool> {
        let result = sqlx::query(
            r"
            DELETE FROM message_mappings
            WHERE userid = $1 AND private_message_id = $2 AND topic_message_id = $3
            ",
        )
        .bind(mapping.user_id.into_inner())
        .bind(mapping.private_message_id.into_inner())
        .bind(mapping.topic_message_id.into_inner())
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let result = sqlx::query(r"DELETE FROM message_mappings WHERE created_at < $1")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn count_total(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM message_mappings")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn count_spam(&self) -> RepoResult<i64> {
        let count =
            sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM message_mappings WHERE spam")
                .fetch_one(&self.pool)
                .await
                .map_err(map_db_error)?;

        Ok(count)
    }

    #[instrument(skip(self))]
    async fn count_by_user(&self, user_id: UserId) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r"SELECT COUNT(*) FROM message_mappings WHERE userid = $1",
        )
        .bind(user_id.into_inner())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(count)
    }
}
