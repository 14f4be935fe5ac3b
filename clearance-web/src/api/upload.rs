//! Roster upload
//!
//! POST /upload takes a multipart form with a `file` field holding the CSV.
//! The batch is committed in one INSERT or not at all.

use axum::{
    extract::{Multipart, State},
    routing::post,
    Json, Router,
};
use clearance_common::ingest::ingest_bytes;
use clearance_common::urls::{clearance_path, verify_path};
use serde::Serialize;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Multipart field carrying the roster
pub const FILE_FIELD: &str = "file";

/// POST /upload response
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: String,
    pub record_id: String,
    pub index_url: String,
    pub verify_url: String,
}

/// Pull the bytes of the `file` field out of the form
async fn read_file_field(multipart: &mut Multipart) -> ApiResult<Vec<u8>> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() == Some(FILE_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?;
            return Ok(bytes.to_vec());
        }
    }

    Err(ApiError::BadRequest(format!(
        "Missing multipart field '{}'",
        FILE_FIELD
    )))
}

/// POST /upload
pub async fn upload_roster(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> ApiResult<Json<UploadResponse>> {
    let bytes = read_file_field(&mut multipart).await?;
    let roster = ingest_bytes(&bytes).map_err(clearance_common::Error::from)?;
    let layout = roster.layout;

    let stored = state.store.put(&roster.into_batch()).await?;

    info!(
        record_id = %stored.record_id,
        layout = %layout,
        rows = stored.batch.rows.len(),
        store = %state.variant(),
        "Roster uploaded"
    );

    Ok(Json(UploadResponse {
        message: "Upload successful".to_string(),
        index_url: clearance_path(&stored.record_id, stored.segments.as_ref()),
        verify_url: verify_path(&stored.record_id),
        record_id: stored.record_id,
    }))
}

/// Build upload routes
pub fn upload_routes() -> Router<AppState> {
    Router::new().route("/upload", post(upload_roster))
}
