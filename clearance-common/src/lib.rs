//! # Clearance Common Library
//!
//! Shared code for the examination clearance service:
//! - Roster models (candidate records, upload batches)
//! - CSV ingestion for WAEC and generic layouts
//! - Remark normalization and recommendation counting
//! - Record id and URL segment generation
//! - Public URL construction
//! - Bootstrap configuration
//! - Database initialization and schema validation

pub mod config;
pub mod db;
pub mod error;
pub mod ingest;
pub mod record_id;
pub mod remark;
pub mod roster;
pub mod segments;
pub mod urls;

pub use error::{Error, Result};
pub use ingest::{IngestError, IngestedRoster, RosterLayout};
pub use roster::{CandidateRecord, StoredRecord, UploadBatch};
pub use segments::UrlSegments;
