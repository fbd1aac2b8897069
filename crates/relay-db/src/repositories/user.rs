//! PostgreSQL implementation of UserRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::User;
use relay_core::traits::{RepoResult, UserRepository};
use relay_core::value_objects::{TopicId, UserId};

use crate::models::UserModel;

use super::error::{map_db_error, map_write_error};

/// PostgreSQL implementation of UserRepository
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    /// Create a new PgUserRepository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_id(&self, id: UserId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT userid, username, first_name, last_name, full_name,
                   language_code, is_premium, topic, first_active_time
            FROM users
            WHERE userid = $1
            ",
        )
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(User::from))
    }

    #[instrument(skip(self))]
    async fn find_by_topic(&self, topic: TopicId) -> RepoResult<Option<User>> {
        let result = sqlx::query_as::<_, UserModel>(
            r"
            SELECT userid, username, first_name, last_name, full_name,
                   language_code, is_premium, topic, first_active_time
            FROM users
            WHERE topic = $1
            ",
        )
        .bind(topic.into_inner())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(result.map(User::from))
    }

    #[instrument(skip(self, user), fields(user_id = %user.id, topic = %user.topic))]
    async fn create(&self, user: &User) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO users (userid, username, first_name, last_name, full_name,
                               language_code, is_premium, topic, first_active_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ",
        )
        .bind(user.id.into_inner())
        .bind(&user.username)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.full_name)
        .bind(&user.language_code)
        .bind(user.is_premium)
        .bind(user.topic.into_inner())
        .bind(user.first_active_time)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn count_topics(&self) -> RepoResult<i64> {
        let count = sqlx::query_scalar::<_, i64>(r"SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(count)
    }
}
