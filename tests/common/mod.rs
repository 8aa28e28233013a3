#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use inventory_api::{
    config::AppConfig,
    db::{self, DbPool},
    entities::{location, product},
    repositories::{LocationRepository, ProductRepository},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Helper harness for spinning up the application backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

/// Configuration for a private in-memory database. A single connection keeps
/// every query on the same SQLite memory instance.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.cors_allow_any_origin = true;
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg
}

/// A migrated in-memory pool for repository-level tests.
pub async fn test_pool() -> DbPool {
    let cfg = test_config();
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    pool
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(cfg: AppConfig) -> Self {
        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(pool, cfg);
        let router = inventory_api::build_router(state.clone());

        Self { router, state }
    }

    pub fn db(&self) -> &DbPool {
        self.state.db.as_ref()
    }

    /// Send a request against the router with an optional JSON body.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, sku: &str) -> product::Model {
        ProductRepository::create(
            self.db(),
            format!("Product {}", sku),
            sku.to_string(),
            None,
        )
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_location(&self, name: &str) -> location::Model {
        LocationRepository::create(
            self.db(),
            name.to_string(),
            format!("{} Industrial Park", name),
            1_000,
        )
        .await
        .expect("seed location for tests")
    }
}

/// Collects a response body as JSON.
pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&bytes).expect("response body is not valid json")
}
