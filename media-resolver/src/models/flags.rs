use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::resolver::{FeatureFlags, ResolveResult};

/// Feature flags persisted in the `feature_flags` table. Unknown flags are off.
#[derive(Debug, Clone)]
pub struct FlagStore {
    pool: SqlitePool
}

impl FlagStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, flag: u32) -> Result<bool, sqlx::Error> {
        let row = sqlx::query("SELECT enabled FROM feature_flags WHERE flag = ?")
            .bind(i64::from(flag))
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some_and(|r| r.get::<i64, _>("enabled") != 0))
    }

    pub async fn set(&self, flag: u32, enabled: bool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r"INSERT INTO feature_flags (flag, enabled) VALUES (?, ?)
               ON CONFLICT(flag) DO UPDATE SET enabled = excluded.enabled, updated_at = datetime('now')"
        )
        .bind(i64::from(flag))
        .bind(i64::from(enabled))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl FeatureFlags for FlagStore {
    async fn is_on(&self, flag: u32) -> ResolveResult<bool> {
        Ok(self.get(flag).await?)
    }
}
