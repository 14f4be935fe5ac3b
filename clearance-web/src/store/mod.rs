//! Record stores
//!
//! One interface, two SQLite-backed implementations selected by
//! configuration:
//!
//! - [`MinimalStore`]: header fields + JSON row blob in `uploads`
//! - [`SegmentedStore`]: the same in `secure_uploads`, plus five random URL
//!   segments generated at `put` and frozen thereafter
//!
//! Batches are write-once. Both stores generate the record id and retry with
//! a fresh id when the primary key is already taken.

use async_trait::async_trait;
use clearance_common::config::StoreVariant;
use clearance_common::record_id::generate_record_id;
use clearance_common::{CandidateRecord, Result, StoredRecord, UploadBatch};
use indexmap::IndexMap;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;

mod minimal;
mod segmented;

pub use minimal::MinimalStore;
pub use segmented::SegmentedStore;

/// Record ids tried per `put` before giving up
pub const MAX_ID_ATTEMPTS: usize = 5;

/// Persists upload batches keyed by record id
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Which implementation this is
    fn variant(&self) -> StoreVariant;

    /// Store a batch under a newly generated record id
    async fn put(&self, batch: &UploadBatch) -> Result<StoredRecord>;

    /// Load a batch by record id
    async fn get(&self, record_id: &str) -> Result<Option<StoredRecord>>;
}

/// Shared handle used by the HTTP layer
pub type SharedStore = Arc<dyn RecordStore>;

/// Build the store named by `variant` over `pool`
pub fn build_store(variant: StoreVariant, pool: SqlitePool) -> SharedStore {
    match variant {
        StoreVariant::Minimal => Arc::new(MinimalStore::new(pool)),
        StoreVariant::Segmented => Arc::new(SegmentedStore::new(pool)),
    }
}

/// Maps a school code to a candidate record id
pub type IdGenerator = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hands out candidate record ids for one `put`
#[derive(Clone)]
pub(crate) struct IdAllocator {
    generator: IdGenerator,
}

impl IdAllocator {
    pub(crate) fn random() -> Self {
        Self {
            generator: Arc::new(generate_record_id),
        }
    }

    pub(crate) fn with_generator(generator: IdGenerator) -> Self {
        Self { generator }
    }

    /// Up to `MAX_ID_ATTEMPTS` fresh ids for `school_code`
    pub(crate) fn candidates<'a>(&'a self, school_code: &'a str) -> impl Iterator<Item = String> + 'a {
        (0..MAX_ID_ATTEMPTS).map(move |_| (self.generator)(school_code))
    }
}

/// True when an INSERT hit an existing primary key
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

pub(crate) fn encode_rows(rows: &[CandidateRecord]) -> Result<String> {
    Ok(serde_json::to_string(rows)?)
}

/// Decode a stored row blob.
///
/// Blobs written before this service may hold `null` for a missing cell and
/// a list of surplus cells under a `null` key. Nulls read as `""`, lists are
/// dropped and other scalars keep their JSON text.
pub(crate) fn decode_rows(rows: Option<String>) -> Result<Vec<CandidateRecord>> {
    let json = match rows {
        Some(json) if !json.trim().is_empty() => json,
        _ => return Ok(Vec::new()),
    };

    let raw: Vec<IndexMap<String, Value>> = serde_json::from_str(&json)?;
    Ok(raw.into_iter().map(record_from_json).collect())
}

fn record_from_json(fields: IndexMap<String, Value>) -> CandidateRecord {
    fields
        .into_iter()
        .filter_map(|(name, value)| match value {
            Value::String(text) => Some((name, text)),
            Value::Null => Some((name, String::new())),
            Value::Array(_) | Value::Object(_) => None,
            other => Some((name, other.to_string())),
        })
        .collect()
}

pub(crate) fn exhausted(school_code: &str) -> clearance_common::Error {
    clearance_common::Error::Internal(format!(
        "Could not allocate a unique record id for school '{}' after {} attempts",
        school_code, MAX_ID_ATTEMPTS
    ))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use clearance_common::db::init_database_pool;
    use sqlx::sqlite::SqlitePoolOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};

    pub async fn memory_pool() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_database_pool(&pool).await.unwrap();
        pool
    }

    /// Yields `{code}-000000` for the first `repeats` calls, then counts up
    pub fn colliding_generator(repeats: usize) -> IdGenerator {
        let calls = Arc::new(AtomicUsize::new(0));
        Arc::new(move |code: &str| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            let suffix = n.saturating_sub(repeats.saturating_sub(1));
            format!("{}-{:06x}", code, suffix)
        })
    }

    pub fn sample_batch() -> UploadBatch {
        let rows = vec![
            [("passport", "P001"), ("lastname", "Okafor"), ("remark", "recommended")]
                .into_iter()
                .collect(),
            [("passport", "P002"), ("lastname", "Bello"), ("remark", "not recommended")]
                .into_iter()
                .collect(),
            [("passport", "P003"), ("lastname", "Adeyemi"), ("remark", "recommended")]
                .into_iter()
                .collect(),
        ];
        UploadBatch {
            school_name: "Acme High".to_string(),
            school_code: "C999".to_string(),
            principal: "Jane Doe".to_string(),
            rows,
        }
    }
}
