//! Table schema definitions
//!
//! Single source of truth for the shape of every table the service reads.

use crate::db::schema_sync::{ColumnDefinition, SchemaSync, TableSchema};
use crate::Result;
use sqlx::SqlitePool;
use tracing::info;

pub const UPLOADS_TABLE: &str = "uploads";
pub const SECURE_UPLOADS_TABLE: &str = "secure_uploads";

fn batch_columns() -> Vec<ColumnDefinition> {
    vec![
        ColumnDefinition::new("record_id", "TEXT").primary_key(),
        ColumnDefinition::new("school_name", "TEXT"),
        ColumnDefinition::new("school_code", "TEXT"),
        ColumnDefinition::new("principal", "TEXT"),
        // JSON array of candidate records
        ColumnDefinition::new("rows", "TEXT"),
    ]
}

/// Batches addressed by record id alone
pub struct UploadsTableSchema;

impl TableSchema for UploadsTableSchema {
    fn table_name() -> &'static str {
        UPLOADS_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        batch_columns()
    }
}

/// Batches gated by five URL segments
pub struct SecureUploadsTableSchema;

impl TableSchema for SecureUploadsTableSchema {
    fn table_name() -> &'static str {
        SECURE_UPLOADS_TABLE
    }

    fn expected_columns() -> Vec<ColumnDefinition> {
        let mut columns = batch_columns();
        columns.extend(
            ["param1", "param2", "param3", "param4", "param5"]
                .into_iter()
                .map(|name| ColumnDefinition::new(name, "TEXT").not_null().default("''")),
        );
        columns
    }
}

/// Validate every table against its declaration
pub async fn sync_all_table_schemas(pool: &SqlitePool) -> Result<()> {
    info!("Validating table schemas");

    let added = SchemaSync::sync_table::<UploadsTableSchema>(pool).await?
        + SchemaSync::sync_table::<SecureUploadsTableSchema>(pool).await?;

    if added > 0 {
        info!("Schema validation added {} column(s)", added);
    }
    Ok(())
}
