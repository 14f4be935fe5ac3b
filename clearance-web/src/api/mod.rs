//! HTTP handlers for clearance-web

pub mod health;
pub mod pages;
pub mod upload;

pub use health::health_routes;
pub use pages::page_routes;
pub use upload::upload_routes;
