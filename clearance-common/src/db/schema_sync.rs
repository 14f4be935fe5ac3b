//! Schema validation and synchronization
//!
//! Table shapes are declared in code (`table_schemas.rs`) and checked against
//! the live database at startup, after `CREATE TABLE IF NOT EXISTS` and the
//! versioned migrations.
//!
//! - Missing columns are added via `ALTER TABLE ADD COLUMN`.
//! - Type or constraint drift cannot be repaired in place and fails startup.

use crate::{Error, Result};
use sqlx::{Row, SqlitePool};
use tracing::{info, warn};

/// Column definition with SQL constraints
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    pub name: String,
    /// SQL type (e.g., "TEXT", "INTEGER")
    pub sql_type: String,
    pub not_null: bool,
    pub primary_key: bool,
    pub default_value: Option<String>,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
            not_null: false,
            primary_key: false,
            default_value: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    /// Set DEFAULT value (raw SQL literal, e.g. `'pending'`)
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

/// Column as reported by `PRAGMA table_info`
#[derive(Debug, Clone)]
pub struct ActualColumn {
    pub cid: i32,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub pk: bool,
}

/// Difference between the declared and the live schema
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaDrift {
    /// Column missing from database (repairable)
    MissingColumn {
        table: String,
        column: ColumnDefinition,
    },
    /// Column type differs from the declaration
    TypeMismatch {
        table: String,
        column: String,
        expected: String,
        actual: String,
    },
    /// Declared constraint absent from the live column
    ConstraintMismatch {
        table: String,
        column: String,
        constraint: String,
    },
}

impl SchemaDrift {
    pub fn is_repairable(&self) -> bool {
        matches!(self, SchemaDrift::MissingColumn { .. })
    }
}

impl std::fmt::Display for SchemaDrift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaDrift::MissingColumn { table, column } => {
                write!(f, "{}.{} is missing", table, column.name)
            }
            SchemaDrift::TypeMismatch { table, column, expected, actual } => write!(
                f,
                "{}.{} has type '{}', expected '{}'",
                table, column, actual, expected
            ),
            SchemaDrift::ConstraintMismatch { table, column, constraint } => {
                write!(f, "{}.{} lacks {}", table, column, constraint)
            }
        }
    }
}

/// Declared shape of one table
pub trait TableSchema {
    fn table_name() -> &'static str;

    /// Column definitions in creation order
    fn expected_columns() -> Vec<ColumnDefinition>;
}

/// Reads the live schema
pub struct SchemaIntrospector;

impl SchemaIntrospector {
    /// Columns of `table_name` ordered by cid
    pub async fn introspect_table(pool: &SqlitePool, table_name: &str) -> Result<Vec<ActualColumn>> {
        let query = format!("PRAGMA table_info({})", table_name);
        let rows = sqlx::query(&query).fetch_all(pool).await?;

        let mut columns: Vec<ActualColumn> = rows
            .iter()
            .map(|row| ActualColumn {
                cid: row.get("cid"),
                name: row.get("name"),
                type_name: row.get("type"),
                not_null: row.get::<i32, _>("notnull") != 0,
                default_value: row.get("dflt_value"),
                pk: row.get::<i32, _>("pk") != 0,
            })
            .collect();

        columns.sort_by_key(|c| c.cid);
        Ok(columns)
    }

    pub async fn table_exists(pool: &SqlitePool, table_name: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM sqlite_master
                WHERE type='table' AND name = ?
            )
            "#,
        )
        .bind(table_name)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }
}

/// Compares declared and live schemas
pub struct SchemaDiff;

impl SchemaDiff {
    pub fn compare(
        table_name: &str,
        expected: &[ColumnDefinition],
        actual: &[ActualColumn],
    ) -> Vec<SchemaDrift> {
        let mut drift = Vec::new();

        for expected_col in expected {
            let Some(actual_col) = actual.iter().find(|c| c.name == expected_col.name) else {
                drift.push(SchemaDrift::MissingColumn {
                    table: table_name.to_string(),
                    column: expected_col.clone(),
                });
                continue;
            };

            if !Self::types_compatible(&expected_col.sql_type, &actual_col.type_name) {
                drift.push(SchemaDrift::TypeMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    expected: expected_col.sql_type.clone(),
                    actual: actual_col.type_name.clone(),
                });
            }

            // SQLite reports notnull=0 for a TEXT PRIMARY KEY, so only
            // non-key columns are checked for NOT NULL.
            if expected_col.not_null && !expected_col.primary_key && !actual_col.not_null {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "NOT NULL".to_string(),
                });
            }

            if expected_col.primary_key && !actual_col.pk {
                drift.push(SchemaDrift::ConstraintMismatch {
                    table: table_name.to_string(),
                    column: expected_col.name.clone(),
                    constraint: "PRIMARY KEY".to_string(),
                });
            }
        }

        drift
    }

    /// SQLite type affinity comparison
    fn types_compatible(expected: &str, actual: &str) -> bool {
        let exp = expected.to_uppercase();
        let act = actual.to_uppercase();

        if exp == act {
            return true;
        }

        let is_int = |t: &str| t.contains("INT");
        let is_text = |t: &str| t.contains("TEXT") || t.contains("CHAR") || t.contains("CLOB");
        let is_real = |t: &str| t.contains("REAL") || t.contains("FLOA") || t.contains("DOUB");

        (is_int(&exp) && is_int(&act))
            || (is_text(&exp) && is_text(&act))
            || (is_real(&exp) && is_real(&act))
    }
}

/// Applies repairable drift and rejects the rest
pub struct SchemaSync;

impl SchemaSync {
    /// Validate one table, adding missing columns.
    ///
    /// Returns the number of columns added. Fails with `Error::Config` when
    /// the table is absent or has drift that `ALTER TABLE` cannot repair.
    pub async fn sync_table<T: TableSchema>(pool: &SqlitePool) -> Result<usize> {
        let table_name = T::table_name();
        let expected = T::expected_columns();

        if !SchemaIntrospector::table_exists(pool, table_name).await? {
            return Err(Error::Config(format!(
                "Table '{}' does not exist after initialization",
                table_name
            )));
        }

        let actual = SchemaIntrospector::introspect_table(pool, table_name).await?;
        let drift = SchemaDiff::compare(table_name, &expected, &actual);

        if drift.is_empty() {
            info!("  ✓ Schema up to date for '{}'", table_name);
            return Ok(0);
        }

        let (repairable, fatal): (Vec<_>, Vec<_>) =
            drift.into_iter().partition(SchemaDrift::is_repairable);

        if !fatal.is_empty() {
            for change in &fatal {
                warn!("  ⚠ Schema drift: {}", change);
            }
            let details: Vec<String> = fatal.iter().map(ToString::to_string).collect();
            return Err(Error::Config(format!(
                "Schema of '{}' cannot be repaired automatically: {}",
                table_name,
                details.join("; ")
            )));
        }

        let mut added = 0;
        for change in repairable {
            if let SchemaDrift::MissingColumn { table, column } = change {
                Self::add_column(pool, &table, &column).await?;
                added += 1;
            }
        }

        Ok(added)
    }

    /// Add a missing column via ALTER TABLE ADD COLUMN
    async fn add_column(pool: &SqlitePool, table: &str, column: &ColumnDefinition) -> Result<()> {
        if column.primary_key {
            return Err(Error::Config(format!(
                "Cannot add PRIMARY KEY column {}.{} to an existing table",
                table, column.name
            )));
        }

        let mut sql = format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            table, column.name, column.sql_type
        );

        match (&column.default_value, column.not_null) {
            (Some(default), true) => sql.push_str(&format!(" NOT NULL DEFAULT {}", default)),
            (Some(default), false) => sql.push_str(&format!(" DEFAULT {}", default)),
            (None, true) => warn!(
                "  ⚠ Cannot add NOT NULL column {}.{} without DEFAULT value. Column will be nullable.",
                table, column.name
            ),
            (None, false) => {}
        }

        info!("  ✓ Adding column: {}.{} ({})", table, column.name, column.sql_type);

        match sqlx::query(&sql).execute(pool).await {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("duplicate column") => {
                info!("  Column {}.{} already added", table, column.name);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }
}
