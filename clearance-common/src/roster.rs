//! Roster models: candidate records and upload batches

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::segments::UrlSegments;

/// Field holding the normalized remark
pub const REMARK_FIELD: &str = "remark";

/// One candidate row: ordered, named string fields.
///
/// Field order follows the source layout and survives storage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CandidateRecord {
    fields: IndexMap<String, String>,
}

impl CandidateRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a field, keeping its original position if already present
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Remark value, empty when the record has none
    pub fn remark(&self) -> &str {
        self.get(REMARK_FIELD).unwrap_or("")
    }

    /// Field names in order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CandidateRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// A school's uploaded roster, write-once
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadBatch {
    pub school_name: String,
    pub school_code: String,
    pub principal: String,
    pub rows: Vec<CandidateRecord>,
}

impl UploadBatch {
    /// Positive recommendations in this batch
    pub fn recommended_count(&self) -> usize {
        crate::remark::count_recommended(&self.rows)
    }
}

/// A persisted batch as returned by a record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredRecord {
    pub record_id: String,
    pub batch: UploadBatch,
    /// Present only for stores that gate URLs by segments
    pub segments: Option<UrlSegments>,
}

impl StoredRecord {
    /// Check supplied URL segments against the stored ones.
    ///
    /// A record stored without segments never matches supplied segments.
    pub fn segments_match(&self, supplied: &UrlSegments) -> bool {
        self.segments
            .as_ref()
            .is_some_and(|stored| stored.matches(supplied))
    }
}
