mod common;

use assert_matches::assert_matches;
use inventory_api::{
    db::{self, DbPool},
    errors::ServiceError,
    repositories::{InventoryRepository, LocationRepository, ProductRepository},
};
use std::{path::Path, sync::Arc};
use uuid::Uuid;

/// A migrated SQLite database in a temporary file, so several pooled
/// connections share the same data.
async fn file_pool(path: &Path) -> DbPool {
    let mut cfg = common::test_config();
    cfg.database_url = format!("sqlite://{}?mode=rwc", path.display());
    cfg.db_max_connections = 5;
    cfg.db_min_connections = 1;

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to open file database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");
    pool
}

fn remove_database_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_withdrawals_never_oversell() {
    let path = std::env::temp_dir().join(format!("inventory-{}.db", Uuid::new_v4()));
    let pool = Arc::new(file_pool(&path).await);

    let product = ProductRepository::create(pool.as_ref(), "Widget".into(), "WID-1".into(), None)
        .await
        .expect("create product");
    let location =
        LocationRepository::create(pool.as_ref(), "Main".into(), "1 Main Street".into(), 500)
            .await
            .expect("create location");
    InventoryRepository::set_stock(pool.as_ref(), product.id, location.id, 10, None)
        .await
        .expect("seed stock");

    let mut tasks = Vec::new();
    for _ in 0..5 {
        let pool = Arc::clone(&pool);
        let (p, l) = (product.id, location.id);
        tasks.push(tokio::spawn(async move {
            InventoryRepository::update_stock(pool.as_ref(), p, l, -6, None).await
        }));
    }

    let mut applied = 0;
    for task in tasks {
        match task.await.expect("task panicked") {
            Ok(item) => {
                applied += 1;
                assert_eq!(item.quantity, 4);
            }
            Err(err) => assert_matches!(err, ServiceError::InsufficientStock(_)),
        }
    }
    assert_eq!(applied, 1, "exactly one withdrawal of 6 fits into 10");

    let item = InventoryRepository::get(pool.as_ref(), product.id, location.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(item.quantity, 4);

    if let Ok(pool) = Arc::try_unwrap(pool) {
        let _ = db::close_pool(pool).await;
    }
    remove_database_files(&path);
}
