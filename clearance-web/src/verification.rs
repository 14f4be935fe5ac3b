//! Verification and listing contexts
//!
//! Loads a stored batch, applies the URL-segment gate, counts
//! recommendations and, for the public page, renders the QR code that points
//! back at the record's registration URL.

use base64::{engine::general_purpose, Engine as _};
use clearance_common::urls::verification_url;
use clearance_common::{CandidateRecord, Error, Result, StoredRecord, UrlSegments};
use image::{ImageFormat, Luma};
use qrcode::QrCode;
use serde::Serialize;
use std::io::Cursor;
use tracing::debug;

use crate::store::RecordStore;

/// Pixel size of one QR module
const QR_MODULE_PIXELS: u32 = 10;

/// Data behind the clearance listing
#[derive(Debug, Clone, Serialize)]
pub struct ListingContext {
    pub record_id: String,
    pub school_name: String,
    pub school_code: String,
    pub principal: String,
    pub recommended_count: usize,
    pub rows: Vec<CandidateRecord>,
}

/// Data behind the public verification page
#[derive(Debug, Clone, Serialize)]
pub struct VerificationContext {
    pub record_id: String,
    pub school_name: String,
    pub school_code: String,
    pub principal: String,
    pub recommended_count: usize,
    /// URL encoded in the QR image
    pub verification_url: String,
    /// Base64-encoded PNG
    pub qr_code: String,
    pub rows: Vec<CandidateRecord>,
}

fn record_not_found() -> Error {
    Error::NotFound("Record not found".to_string())
}

/// Fetch a record, rejecting unknown ids and mismatched segments alike
pub async fn load_record(
    store: &dyn RecordStore,
    record_id: &str,
    segments: Option<&UrlSegments>,
) -> Result<StoredRecord> {
    let stored = store.get(record_id).await?.ok_or_else(record_not_found)?;

    if let Some(supplied) = segments {
        if !stored.segments_match(supplied) {
            debug!(record_id = %record_id, "URL segments rejected");
            return Err(record_not_found());
        }
    }

    Ok(stored)
}

/// Build the listing context for `record_id`
pub async fn build_listing_context(
    store: &dyn RecordStore,
    record_id: &str,
    segments: Option<&UrlSegments>,
) -> Result<ListingContext> {
    let stored = load_record(store, record_id, segments).await?;
    let recommended_count = stored.batch.recommended_count();

    Ok(ListingContext {
        record_id: stored.record_id,
        school_name: stored.batch.school_name,
        school_code: stored.batch.school_code,
        principal: stored.batch.principal,
        recommended_count,
        rows: stored.batch.rows,
    })
}

/// Build the verification context for `record_id`.
///
/// The QR payload carries the record's stored segments, if any.
pub async fn build_verification_context(
    store: &dyn RecordStore,
    base_url: &str,
    record_id: &str,
    segments: Option<&UrlSegments>,
) -> Result<VerificationContext> {
    let stored = load_record(store, record_id, segments).await?;
    let recommended_count = stored.batch.recommended_count();

    let url = verification_url(base_url, &stored.record_id, stored.segments.as_ref());
    let qr_code = qr_png_base64(&url)?;

    Ok(VerificationContext {
        record_id: stored.record_id,
        school_name: stored.batch.school_name,
        school_code: stored.batch.school_code,
        principal: stored.batch.principal,
        recommended_count,
        verification_url: url,
        qr_code,
        rows: stored.batch.rows,
    })
}

/// Encode `payload` as a QR code and rasterize it to PNG bytes
pub fn render_qr_png(payload: &str) -> Result<Vec<u8>> {
    let code = QrCode::new(payload.as_bytes())
        .map_err(|e| Error::Internal(format!("QR encoding failed: {}", e)))?;

    let image = code
        .render::<Luma<u8>>()
        .module_dimensions(QR_MODULE_PIXELS, QR_MODULE_PIXELS)
        .build();

    let mut png = Cursor::new(Vec::new());
    image
        .write_to(&mut png, ImageFormat::Png)
        .map_err(|e| Error::Internal(format!("PNG encoding failed: {}", e)))?;

    Ok(png.into_inner())
}

/// QR PNG for `payload`, base64 encoded (standard alphabet, padded)
pub fn qr_png_base64(payload: &str) -> Result<String> {
    Ok(general_purpose::STANDARD.encode(render_qr_png(payload)?))
}
