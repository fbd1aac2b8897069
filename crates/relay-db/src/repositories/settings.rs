//! PostgreSQL implementation of SettingsRepository

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use relay_core::entities::RuntimeSetting;
use relay_core::traits::{RepoResult, SettingsRepository};

use super::error::map_db_error;

/// PostgreSQL implementation of SettingsRepository
#[derive(Clone)]
pub struct PgSettingsRepository {
    pool: PgPool,
}

impl PgSettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsRepository for PgSettingsRepository {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = sqlx::query_scalar::<_, String>(r"SELECT value FROM settings WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(value)
    }

    #[instrument(skip(self))]
    async fn insert(&self, setting: &RuntimeSetting) -> RepoResult<()> {
        sqlx::query(
            r"
            INSERT INTO settings (key, value)
            VALUES ($1, $2)
            ON CONFLICT (key) DO NOTHING
            ",
        )
        .bind(&setting.key)
        .bind(&setting.value)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn delete(&self, key: &str) -> RepoResult<()> {
        sqlx::query(r"DELETE FROM settings WHERE key = $1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;

        Ok(())
    }
}
