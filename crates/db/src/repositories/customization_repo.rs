//! Repository for the `customizations` table.

use docflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::customization::Customization;

const COLUMNS: &str = "key, value, updated_by, updated_at";

pub struct CustomizationRepo;

impl CustomizationRepo {
    pub async fn list(pool: &PgPool) -> Result<Vec<Customization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customizations ORDER BY key");
        sqlx::query_as::<_, Customization>(&query)
            .fetch_all(pool)
            .await
    }

    pub async fn find(pool: &PgPool, key: &str) -> Result<Option<Customization>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM customizations WHERE key = $1");
        sqlx::query_as::<_, Customization>(&query)
            .bind(key)
            .fetch_optional(pool)
            .await
    }

    /// Insert or replace the value for `key`.
    pub async fn upsert(
        pool: &PgPool,
        key: &str,
        value: &serde_json::Value,
        updated_by: DbId,
    ) -> Result<Customization, sqlx::Error> {
        let query = format!(
            "INSERT INTO customizations (key, value, updated_by)
             VALUES ($1, $2, $3)
             ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_by = EXCLUDED.updated_by,
                updated_at = NOW()
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Customization>(&query)
            .bind(key)
            .bind(value)
            .bind(updated_by)
            .fetch_one(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, key: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM customizations WHERE key = $1")
            .bind(key)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
