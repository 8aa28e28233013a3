//! Inventory API Library
//!
//! Products, storage locations and per-location stock records served over
//! HTTP, backed by sea-orm.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod repositories;
pub mod telemetry;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
}

impl AppState {
    pub fn new(db: DatabaseConnection, config: config::AppConfig) -> Self {
        Self {
            db: Arc::new(db),
            config,
        }
    }
}

/// Location, product and inventory routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(handlers::locations::locations_routes())
        .merge(handlers::products::products_routes())
        .merge(handlers::inventory::inventory_routes())
}

/// Full application router with operational endpoints, Swagger UI, HTTP
/// tracing and request ids. CORS and compression are left to the binary.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/status", get(handlers::health::api_status))
        .merge(api_routes())
        .merge(openapi::swagger_ui())
        .layer(telemetry::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
