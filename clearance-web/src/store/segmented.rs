//! Record store with URL segments (`secure_uploads` table)

use async_trait::async_trait;
use clearance_common::config::StoreVariant;
use clearance_common::{Result, StoredRecord, UploadBatch, UrlSegments};
use sqlx::{Row, SqlitePool};
use tracing::{debug, warn};

use super::{decode_rows, encode_rows, exhausted, is_unique_violation, IdAllocator, IdGenerator, RecordStore};

/// Batches whose public paths carry five random segments
#[derive(Clone)]
pub struct SegmentedStore {
    pool: SqlitePool,
    ids: IdAllocator,
}

impl SegmentedStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            ids: IdAllocator::random(),
        }
    }

    /// Store using a custom record id generator
    pub fn with_id_generator(pool: SqlitePool, generator: IdGenerator) -> Self {
        Self {
            pool,
            ids: IdAllocator::with_generator(generator),
        }
    }
}

#[async_trait]
impl RecordStore for SegmentedStore {
    fn variant(&self) -> StoreVariant {
        StoreVariant::Segmented
    }

    async fn put(&self, batch: &UploadBatch) -> Result<StoredRecord> {
        let rows = encode_rows(&batch.rows)?;
        // Drawn once per upload; a record id retry keeps them
        let segments = UrlSegments::generate();

        for record_id in self.ids.candidates(&batch.school_code) {
            let result = sqlx::query(
                r#"
                INSERT INTO secure_uploads (
                    record_id, school_name, school_code, principal, rows,
                    param1, param2, param3, param4, param5
                )
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&record_id)
            .bind(&batch.school_name)
            .bind(&batch.school_code)
            .bind(&batch.principal)
            .bind(&rows)
            .bind(&segments.param1)
            .bind(&segments.param2)
            .bind(&segments.param3)
            .bind(&segments.param4)
            .bind(&segments.param5)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => {
                    debug!(record_id = %record_id, rows = batch.rows.len(), "Stored gated batch");
                    return Ok(StoredRecord {
                        record_id,
                        batch: batch.clone(),
                        segments: Some(segments),
                    });
                }
                Err(e) if is_unique_violation(&e) => {
                    warn!(record_id = %record_id, "Record id already taken, regenerating");
                }
                Err(e) => return Err(e.into()),
            }
        }

        Err(exhausted(&batch.school_code))
    }

    async fn get(&self, record_id: &str) -> Result<Option<StoredRecord>> {
        let row = sqlx::query(
            r#"
            SELECT school_name, school_code, principal, rows,
                   param1, param2, param3, param4, param5
            FROM secure_uploads
            WHERE record_id = ?
            "#,
        )
        .bind(record_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let segments = UrlSegments::new(
            row.get::<String, _>("param1"),
            row.get::<String, _>("param2"),
            row.get::<String, _>("param3"),
            row.get::<String, _>("param4"),
            row.get::<String, _>("param5"),
        );

        let batch = UploadBatch {
            school_name: row.get::<Option<String>, _>("school_name").unwrap_or_default(),
            school_code: row.get::<Option<String>, _>("school_code").unwrap_or_default(),
            principal: row.get::<Option<String>, _>("principal").unwrap_or_default(),
            rows: decode_rows(row.get("rows"))?,
        };

        Ok(Some(StoredRecord {
            record_id: record_id.to_string(),
            batch,
            segments: Some(segments),
        }))
    }
}
