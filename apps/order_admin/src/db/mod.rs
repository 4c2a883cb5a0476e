// apps/order_admin/src/db/mod.rs

//! PostgreSQL implementations of the lifecycle core's storage and directory traits.

mod directory;
mod orders;

pub use directory::PgDirectory;
pub use orders::PgOrderStore;

use order_lifecycle::StoreError;
use sqlx::PgPool;
use tracing::info;

const SCHEMA: &str = include_str!("../../schema.sql");

/// Runs the bundled schema. Every statement is idempotent.
pub async fn apply_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
  sqlx::raw_sql(SCHEMA).execute(pool).await?;
  info!("Database schema applied.");
  Ok(())
}

pub(crate) fn store_error(err: sqlx::Error) -> StoreError {
  match &err {
    sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Conflict(db.message().to_string()),
    _ => StoreError::Backend(err.to_string()),
  }
}
