//! Docflow persistence layer.
//!
//! - [`models`]: `FromRow` row structs and their create/update DTOs.
//! - [`repositories`]: zero-sized PostgreSQL repositories.
//! - [`store`]: the injectable store traits the HTTP layer depends on, with
//!   the PostgreSQL implementation delegating to the repositories.
//! - [`memory`]: an in-process implementation of the same traits.

use sqlx::postgres::PgPoolOptions;

pub mod memory;
pub mod models;
pub mod repositories;
pub mod store;

pub use store::{StoreError, StoreResult, Stores};

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Run a trivial query to verify the database is reachable.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply pending migrations from `crates/db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
