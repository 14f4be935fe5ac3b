//! Versioned schema migrations
//!
//! Applied migrations are recorded in `schema_version`. Each migration is
//! idempotent so a half-applied run can simply be repeated.
//!
//! Never modify an existing migration; add a new one and bump
//! `CURRENT_SCHEMA_VERSION`.

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

use super::table_schemas::UPLOADS_TABLE;

/// Current schema version
pub const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Latest applied version, 0 when none
pub async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT OR IGNORE INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: blank out NULL header fields in `uploads`.
///
/// Tables created before this service declared its schema allowed NULL
/// school identity columns; readers expect text.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    info!("Running migration v1: normalize NULL identity fields in {}", UPLOADS_TABLE);

    let result = sqlx::query(
        r#"
        UPDATE uploads SET
            school_name = COALESCE(school_name, ''),
            school_code = COALESCE(school_code, ''),
            principal = COALESCE(principal, ''),
            rows = COALESCE(rows, '[]')
        WHERE school_name IS NULL
           OR school_code IS NULL
           OR principal IS NULL
           OR rows IS NULL
        "#,
    )
    .execute(pool)
    .await?;

    if result.rows_affected() > 0 {
        info!("  ✓ Normalized {} legacy row(s)", result.rows_affected());
    }
    Ok(())
}
