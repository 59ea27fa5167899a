//! PostgreSQL backend: `$n` placeholders, `TIMESTAMPTZ` columns.

pub mod queries;

use sqlx::migrate::Migrator;

pub type Db = sqlx::Postgres;

/// Migrations under `migrations/postgres`, embedded at compile time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations/postgres");
