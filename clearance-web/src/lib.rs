//! clearance-web library - examination clearance HTTP service
//!
//! Upload a candidate roster, then browse it through the clearance listing
//! and the public QR verification page.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use clearance_common::config::StoreVariant;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod error;
pub mod render;
pub mod store;
pub mod verification;

pub use crate::error::{ApiError, ApiResult};
use crate::store::SharedStore;

/// Largest accepted upload body
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Record store selected by configuration
    pub store: SharedStore,
    /// Public base URL used in QR payloads
    pub base_url: String,
}

impl AppState {
    pub fn new(store: SharedStore, base_url: impl Into<String>) -> Self {
        Self {
            store,
            base_url: base_url.into(),
        }
    }

    pub fn variant(&self) -> StoreVariant {
        self.store.variant()
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::page_routes())
        .merge(api::upload_routes())
        .merge(api::health_routes())
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
