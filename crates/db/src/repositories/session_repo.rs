//! Refresh sessions (`user_sessions`).
//!
//! A refresh token is single use: [`SessionRepo::consume`] claims the row and
//! revokes it in one statement, so two concurrent refreshes with the same
//! token cannot both succeed.

use docflow_core::types::DbId;
use sqlx::PgPool;

use crate::models::session::{CreateSession, UserSession};

const SESSION_COLUMNS: &str =
    "id, user_id, refresh_token_hash, expires_at, is_revoked, user_agent, created_at";

pub struct SessionRepo;

impl SessionRepo {
    pub async fn create(pool: &PgPool, input: &CreateSession) -> Result<UserSession, sqlx::Error> {
        sqlx::query_as::<_, UserSession>(&format!(
            "INSERT INTO user_sessions (user_id, refresh_token_hash, expires_at, user_agent)
             VALUES ($1, $2, $3, $4)
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(input.user_id)
        .bind(&input.refresh_token_hash)
        .bind(input.expires_at)
        .bind(&input.user_agent)
        .fetch_one(pool)
        .await
    }

    /// Revoke the live session holding `refresh_token_hash` and return it as
    /// it was before revocation. `None` if the token is unknown, expired or
    /// already used.
    pub async fn consume(
        pool: &PgPool,
        refresh_token_hash: &str,
    ) -> Result<Option<UserSession>, sqlx::Error> {
        sqlx::query_as::<_, UserSession>(&format!(
            "UPDATE user_sessions SET is_revoked = true
             WHERE refresh_token_hash = $1
               AND NOT is_revoked
               AND expires_at > NOW()
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(refresh_token_hash)
        .fetch_optional(pool)
        .await
    }

    /// Sign a user out everywhere. Returns how many sessions were live.
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: DbId) -> Result<u64, sqlx::Error> {
        let done = sqlx::query(
            "UPDATE user_sessions SET is_revoked = true WHERE user_id = $1 AND NOT is_revoked",
        )
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(done.rows_affected())
    }

    /// Drop sessions that can no longer be refreshed.
    pub async fn purge_dead(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let done = sqlx::query("DELETE FROM user_sessions WHERE is_revoked OR expires_at <= NOW()")
            .execute(pool)
            .await?;
        Ok(done.rows_affected())
    }
}
