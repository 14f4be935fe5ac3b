//! HTML page routes
//!
//! Record paths take one of two shapes:
//!
//! - `/{record_id}`
//! - `/{p1}/{p2}/{p3}/{p4}/{p5}/{record_id}` (URL-segment gated)
//!
//! With the segmented store, the listing and registration pages only answer
//! the gated shape; `/verify/{record_id}` stays public for both stores.

use axum::{
    extract::{Path, State},
    response::Html,
    routing::get,
    Router,
};
use clearance_common::config::StoreVariant;
use clearance_common::UrlSegments;

use crate::error::{ApiError, PageResult};
use crate::render;
use crate::verification::{build_listing_context, build_verification_context};
use crate::AppState;

/// A record path split into its optional segments and the record id
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordPath {
    pub segments: Option<UrlSegments>,
    pub record_id: String,
}

/// Parse the wildcard tail of a record route
pub fn parse_record_path(path: &str) -> Option<RecordPath> {
    let parts: Vec<&str> = path.trim_matches('/').split('/').collect();
    if parts.iter().any(|p| p.is_empty()) {
        return None;
    }

    match parts.as_slice() {
        [record_id] => Some(RecordPath {
            segments: None,
            record_id: record_id.to_string(),
        }),
        [p1, p2, p3, p4, p5, record_id] => Some(RecordPath {
            segments: Some(UrlSegments::new(*p1, *p2, *p3, *p4, *p5)),
            record_id: record_id.to_string(),
        }),
        _ => None,
    }
}

/// Resolve a record path, enforcing the segmented store's gate
fn gated_path(state: &AppState, path: &str) -> Result<RecordPath, ApiError> {
    let parsed = parse_record_path(path).ok_or_else(ApiError::record_not_found)?;

    if state.variant() == StoreVariant::Segmented && parsed.segments.is_none() {
        return Err(ApiError::record_not_found());
    }
    Ok(parsed)
}

/// GET /
pub async fn upload_page() -> Html<String> {
    Html(render::upload_page())
}

/// GET /clearance/{record_id} and the gated six-part form
pub async fn clearance_page(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PageResult<Html<String>> {
    let target = gated_path(&state, &path)?;
    let ctx = build_listing_context(
        state.store.as_ref(),
        &target.record_id,
        target.segments.as_ref(),
    )
    .await?;

    Ok(Html(render::listing_page(&ctx)))
}

/// GET /verify/{record_id}
pub async fn verify_page(
    State(state): State<AppState>,
    Path(record_id): Path<String>,
) -> PageResult<Html<String>> {
    let ctx = build_verification_context(state.store.as_ref(), &state.base_url, &record_id, None).await?;
    Ok(Html(render::verification_page(&ctx)))
}

/// GET /core/structure/registration/{record_id} and the gated form
///
/// Target of the QR payload.
pub async fn registration_page(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> PageResult<Html<String>> {
    let target = gated_path(&state, &path)?;
    let ctx = build_verification_context(
        state.store.as_ref(),
        &state.base_url,
        &target.record_id,
        target.segments.as_ref(),
    )
    .await?;

    Ok(Html(render::verification_page(&ctx)))
}

/// Build page routes
pub fn page_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(upload_page))
        .route("/clearance/*path", get(clearance_page))
        .route("/verify/:record_id", get(verify_page))
        .route("/core/structure/registration/*path", get(registration_page))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_path() {
        assert_eq!(
            parse_record_path("C999-0a1b2c"),
            Some(RecordPath {
                segments: None,
                record_id: "C999-0a1b2c".to_string()
            })
        );
        assert_eq!(
            parse_record_path("/C999-0a1b2c").map(|p| p.record_id),
            Some("C999-0a1b2c".to_string())
        );
    }

    #[test]
    fn test_parse_gated_path() {
        let parsed = parse_record_path("123/abcdefg/7/456/42/C999-0a1b2c").unwrap();
        assert_eq!(parsed.record_id, "C999-0a1b2c");
        assert_eq!(
            parsed.segments,
            Some(UrlSegments::new("123", "abcdefg", "7", "456", "42"))
        );
    }

    #[test]
    fn test_parse_rejects_other_shapes() {
        assert_eq!(parse_record_path(""), None);
        assert_eq!(parse_record_path("a/b"), None);
        assert_eq!(parse_record_path("1/2/3/4/5"), None);
        assert_eq!(parse_record_path("1/2/3/4/5/6/7"), None);
        assert_eq!(parse_record_path("1//3/4/5/6"), None);
    }
}
