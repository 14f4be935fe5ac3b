//! Database initialization
//!
//! Runs once at startup, before the HTTP listener binds:
//! 1. Open (or create) the database
//! 2. `CREATE TABLE IF NOT EXISTS` for every table
//! 3. Versioned migrations
//! 4. Schema validation against the declared table shapes

use crate::Result;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

/// Open the database named by `database_url` and prepare its schema
pub async fn init_database(database_url: &str) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(Duration::from_millis(5000));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect_with(options)
        .await?;

    info!("Opened database: {}", database_url);

    init_database_pool(&pool).await?;
    Ok(pool)
}

/// Prepare the schema on an already-open pool
pub async fn init_database_pool(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_uploads_table(pool).await?;
    create_secure_uploads_table(pool).await?;

    crate::db::migrations::run_migrations(pool).await?;
    crate::db::table_schemas::sync_all_table_schemas(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_uploads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS uploads (
            record_id TEXT PRIMARY KEY,
            school_name TEXT,
            school_code TEXT,
            principal TEXT,
            rows TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_secure_uploads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS secure_uploads (
            record_id TEXT PRIMARY KEY,
            school_name TEXT,
            school_code TEXT,
            principal TEXT,
            rows TEXT,
            param1 TEXT NOT NULL,
            param2 TEXT NOT NULL,
            param3 TEXT NOT NULL,
            param4 TEXT NOT NULL,
            param5 TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
