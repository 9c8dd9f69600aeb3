//! PostgreSQL backend.
//!
//! ## Error Mapping
//!
//! | PostgreSQL error code | StoreError |
//! |-----------------------|------------|
//! | `23505` unique violation | `Conflict` |
//! | `23503` foreign key violation | `NotFound` (a referenced row is missing) |
//! | anything else | `Database` |

mod blog;
mod catalog;
mod users;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::instrument;

use crate::{StoreError, StoreResult};

const SCHEMA: &str = include_str!("schema.sql");

/// sqlx-backed store. Cheap to clone; clones share the pool.
#[derive(Debug, Clone)]
pub struct PgDatabase {
    pool: PgPool,
}

impl PgDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect and apply the schema.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;
        let db = Self::new(pool);
        db.migrate().await?;
        Ok(db)
    }

    /// Create any missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA).execute(&self.pool).await?;
        tracing::info!("database schema applied");
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

/// Map constraint violations onto the backend-neutral variants.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        let msg = format!("{operation}: {}", db_err.message());
        match db_err.code().as_deref() {
            Some("23505") => return StoreError::Conflict(msg),
            Some("23503") => return StoreError::NotFound(msg),
            _ => {}
        }
    }
    StoreError::Database(err)
}

/// Rows touched by a DELETE or UPDATE keyed on `id`; zero means not found.
fn expect_one(affected: u64, what: impl FnOnce() -> String) -> StoreResult<()> {
    if affected == 0 {
        Err(StoreError::NotFound(what()))
    } else {
        Ok(())
    }
}

/// Escape `%`, `_` and `\` so user text is matched literally by `ILIKE`.
fn like_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_patterns_are_escaped() {
        assert_eq!(like_escape("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(like_escape("plain"), "plain");
    }

    #[test]
    fn zero_rows_is_not_found() {
        assert!(matches!(expect_one(0, || "post".to_string()), Err(StoreError::NotFound(_))));
        assert!(expect_one(1, || "post".to_string()).is_ok());
    }
}
