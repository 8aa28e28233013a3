//! Per-request transaction scope.
//!
//! Handlers never share a session: each mutating request opens one
//! transaction here and passes `&DatabaseTransaction` down to the
//! repositories, which accept any `ConnectionTrait`.

use crate::errors::ServiceError;
use metrics::counter;
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionError, TransactionTrait};
use std::future::Future;
use std::pin::Pin;
use std::time::Instant;
use tracing::{debug, warn};

/// Type alias for boxed future used in transactions
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Execute a function within a database transaction
///
/// Commits when `f` returns `Ok` and rolls back when it returns `Err`; the
/// error from `f` is handed back unchanged so business-rule failures keep
/// their own variant.
///
/// # Example
///
/// ```rust,ignore
/// let item = with_transaction(&db, |txn| {
///     Box::pin(async move {
///         InventoryRepository::update_stock(txn, product_id, location_id, 5, None).await
///     })
/// })
/// .await?;
/// ```
pub async fn with_transaction<F, T>(db: &DatabaseConnection, f: F) -> Result<T, ServiceError>
where
    F: for<'c> FnOnce(&'c DatabaseTransaction) -> BoxFuture<'c, Result<T, ServiceError>> + Send,
    T: Send,
{
    let start = Instant::now();
    let result = db.transaction::<_, T, ServiceError>(f).await;
    let elapsed = start.elapsed();

    match &result {
        Ok(_) => {
            counter!("inventory_db.transaction.committed", 1);
            debug!("Transaction committed in {:?}", elapsed);
        }
        Err(err) => {
            counter!("inventory_db.transaction.rolled_back", 1);
            warn!("Transaction rolled back after {:?}: {}", elapsed, err);
        }
    }

    result.map_err(|e| match e {
        TransactionError::Connection(db_err) => ServiceError::DatabaseError(db_err),
        TransactionError::Transaction(err) => err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::location;
    use crate::migrator::Migrator;
    use assert_matches::assert_matches;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, EntityTrait, PaginatorTrait, Set};
    use sea_orm_migration::MigratorTrait;

    async fn setup() -> DatabaseConnection {
        let mut opt = ConnectOptions::new("sqlite::memory:");
        opt.max_connections(1).min_connections(1);
        let db = Database::connect(opt).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        db
    }

    fn new_location(name: &str) -> location::ActiveModel {
        location::ActiveModel {
            name: Set(name.to_string()),
            address: Set("1 Dock Street".to_string()),
            capacity: Set(10),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn commits_on_success() {
        let db = setup().await;

        let created = with_transaction(&db, |txn| {
            Box::pin(async move { Ok(new_location("North").insert(txn).await?) })
        })
        .await
        .unwrap();

        let stored = location::Entity::find_by_id(created.id).one(&db).await.unwrap();
        assert_eq!(stored, Some(created));
    }

    #[tokio::test]
    async fn rolls_back_and_preserves_error_variant() {
        let db = setup().await;

        let result: Result<(), ServiceError> = with_transaction(&db, |txn| {
            Box::pin(async move {
                new_location("South").insert(txn).await?;
                Err(ServiceError::InsufficientStock("nope".into()))
            })
        })
        .await;

        assert_matches!(result, Err(ServiceError::InsufficientStock(_)));
        assert_eq!(location::Entity::find().count(&db).await.unwrap(), 0);
    }
}
