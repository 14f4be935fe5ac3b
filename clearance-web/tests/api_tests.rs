//! Integration tests for clearance-web HTTP endpoints
//!
//! Each test builds the full router over an in-memory SQLite database and
//! drives it with `oneshot` requests.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use clearance_common::config::StoreVariant;
use clearance_common::db::init_database_pool;
use clearance_web::store::build_store;
use clearance_web::{build_router, AppState};
use serde_json::Value;
use sqlx::sqlite::SqlitePoolOptions;
use tower::util::ServiceExt; // for `oneshot` method

const BASE_URL: &str = "https://clearance.example.org";
const BOUNDARY: &str = "clearance-test-boundary";

const WAEC_CSV: &str = "\
WEST AFRICAN EXAMINATIONS COUNCIL,,,,,,,,,,
SCHOOL NAME,Acme High
SCHOOL CODE,C999
NAME OF PRINCIPAL,Jane Doe

#,PASSPORT,LIN,SURNAME,FIRST NAME,OTHER NAME,SEX,2026,2025,2024,REMARK
1,P001,L001,Okafor,Ada,Ngozi,F,A1,B2,C4,Recomended
2,P002,L002,Bello,Tunde,,M,C5,C6,D7,Not Recommended
3,P003,L003,Adeyemi,Kemi,,F,B3,B3,B2, recommended
";

const GENERIC_CSV: &str = "\
passport,name,remark
P001,Ada Okafor,recommended
P002,Tunde Bello,
";

/// Test helper: app over a fresh in-memory database
async fn setup_app(variant: StoreVariant) -> Router {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Should open in-memory database");
    init_database_pool(&pool)
        .await
        .expect("Should initialize schema");

    build_router(AppState::new(build_store(variant, pool), BASE_URL))
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

/// Test helper: multipart POST /upload with one field
fn upload_request(field: &str, content: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{}\"; filename=\"roster.csv\"\r\n",
            field
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: text/csv\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{}--\r\n", BOUNDARY).as_bytes());

    Request::builder()
        .method("POST")
        .uri("/upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(body))
        .unwrap()
}

async fn body_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

async fn extract_json(body: Body) -> Value {
    serde_json::from_slice(&body_bytes(body).await).expect("Should parse JSON")
}

async fn extract_text(body: Body) -> String {
    String::from_utf8(body_bytes(body).await).expect("Should be UTF-8")
}

/// Test helper: upload and return the JSON response
async fn upload(app: &Router, csv: &str) -> Value {
    let response = app
        .clone()
        .oneshot(upload_request("file", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    extract_json(response.into_body()).await
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(StoreVariant::Segmented).await;

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "clearance-web");
    assert_eq!(body["store"], "segmented");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_upload_page_served() {
    let app = setup_app(StoreVariant::Minimal).await;

    let response = app.oneshot(get("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Upload candidate roster"));
    assert!(html.contains("name=\"file\""));
}

// =============================================================================
// Upload -> listing -> verification (minimal store)
// =============================================================================

#[tokio::test]
async fn test_waec_upload_flow() {
    let app = setup_app(StoreVariant::Minimal).await;

    let body = upload(&app, WAEC_CSV).await;
    assert_eq!(body["message"], "Upload successful");

    let record_id = body["record_id"].as_str().unwrap().to_string();
    assert!(record_id.starts_with("C999-"));
    assert_eq!(record_id.len(), "C999-".len() + 6);
    assert_eq!(body["index_url"], format!("/clearance/{}", record_id));
    assert_eq!(body["verify_url"], format!("/verify/{}", record_id));

    let response = app
        .clone()
        .oneshot(get(body["index_url"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Acme High"));
    assert!(html.contains("Jane Doe"));
    assert!(html.contains("Okafor"));
    assert!(html.contains("Recommended candidates: <strong>2</strong> of 3"));

    let response = app
        .clone()
        .oneshot(get(body["verify_url"].as_str().unwrap()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("Recommended candidates: <strong>2</strong>"));
    assert!(html.contains("data:image/png;base64,"));
    assert!(html.contains(&format!(
        "{}/core/structure/registration/{}",
        BASE_URL, record_id
    )));

    let response = app
        .oneshot(get(&format!("/core/structure/registration/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_generic_upload_uses_placeholder_identity() {
    let app = setup_app(StoreVariant::Minimal).await;

    let body = upload(&app, GENERIC_CSV).await;
    let record_id = body["record_id"].as_str().unwrap();
    assert!(record_id.starts_with("C24084-"));

    let response = app
        .oneshot(get(&format!("/clearance/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    assert!(html.contains("CLIMAX SECONDARY SCHOOL"));
    assert!(html.contains("Recommended candidates: <strong>1</strong> of 2"));
}

#[tokio::test]
async fn test_unknown_record_is_404() {
    let app = setup_app(StoreVariant::Minimal).await;

    for uri in [
        "/clearance/C999-ffffff",
        "/verify/C999-ffffff",
        "/core/structure/registration/C999-ffffff",
    ] {
        let response = app.clone().oneshot(get(uri)).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        let html = extract_text(response.into_body()).await;
        assert!(html.contains("Record not found"), "{}", uri);
    }
}

#[tokio::test]
async fn test_uploaded_values_are_escaped() {
    let app = setup_app(StoreVariant::Minimal).await;

    let body = upload(&app, "name,remark\n<script>alert(1)</script>,recommended\n").await;
    let response = app
        .oneshot(get(body["index_url"].as_str().unwrap()))
        .await
        .unwrap();
    let html = extract_text(response.into_body()).await;
    assert!(!html.contains("<script>alert(1)</script>"));
    assert!(html.contains("&lt;script&gt;"));
}

// =============================================================================
// Upload failures
// =============================================================================

#[tokio::test]
async fn test_malformed_waec_row_rejected() {
    let app = setup_app(StoreVariant::Minimal).await;

    let csv = "SCHOOL NAME,Acme High\nSCHOOL CODE,C999\n#\n1,P001,L001\n";
    let response = app
        .oneshot(upload_request("file", csv.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "MALFORMED_INPUT");
}

#[tokio::test]
async fn test_invalid_utf8_rejected() {
    let app = setup_app(StoreVariant::Minimal).await;

    let response = app
        .oneshot(upload_request("file", &[0xff, 0xfe, b'a', b',', 0xc3]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_file_field_rejected() {
    let app = setup_app(StoreVariant::Minimal).await;

    let response = app
        .oneshot(upload_request("roster", GENERIC_CSV.as_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
}

// =============================================================================
// Segmented store gate
// =============================================================================

#[tokio::test]
async fn test_segmented_upload_flow() {
    let app = setup_app(StoreVariant::Segmented).await;

    let body = upload(&app, WAEC_CSV).await;
    let record_id = body["record_id"].as_str().unwrap().to_string();
    let index_url = body["index_url"].as_str().unwrap().to_string();

    // /clearance/{p1}/{p2}/{p3}/{p4}/{p5}/{record_id}
    let parts: Vec<&str> = index_url.trim_start_matches('/').split('/').collect();
    assert_eq!(parts.len(), 7);
    assert_eq!(parts[0], "clearance");
    assert_eq!(parts[6], record_id);
    let segments = parts[1..6].join("/");

    let response = app.clone().oneshot(get(&index_url)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Plain listing is closed for segmented records
    let response = app
        .clone()
        .oneshot(get(&format!("/clearance/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Verification stays public and points the QR at the gated target
    let response = app
        .clone()
        .oneshot(get(&format!("/verify/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let html = extract_text(response.into_body()).await;
    let qr_target = format!(
        "{}/core/structure/registration/{}/{}",
        BASE_URL, segments, record_id
    );
    assert!(html.contains(&qr_target));

    let response = app
        .clone()
        .oneshot(get(&format!(
            "/core/structure/registration/{}/{}",
            segments, record_id
        )))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(get(&format!("/core/structure/registration/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_segmented_wrong_segments_is_404() {
    let app = setup_app(StoreVariant::Segmented).await;

    let body = upload(&app, WAEC_CSV).await;
    let record_id = body["record_id"].as_str().unwrap();

    let response = app
        .oneshot(get(&format!("/clearance/0/0/0/0/0/{}", record_id)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_wrong_path_shape_is_404() {
    let app = setup_app(StoreVariant::Minimal).await;

    let response = app
        .oneshot(get("/clearance/a/b/C999-000000"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
