//! Data access for products, locations and stock records.
//!
//! Repositories are stateless: every function takes the connection it should
//! run on, either the pool or an open transaction, so callers decide the
//! transaction scope.

use sea_orm::sea_query::{Expr, Func, IntoColumnRef, SimpleExpr};

pub mod inventory_repository;
pub mod location_repository;
pub mod product_repository;

pub use inventory_repository::InventoryRepository;
pub use location_repository::{LocationChanges, LocationRepository, LocationWithStock};
pub use product_repository::{ProductChanges, ProductRepository};

/// `%term%`, lower-cased, for use with [`lower_like`].
pub(crate) fn contains_pattern(term: &str) -> String {
    format!("%{}%", term.to_lowercase())
}

/// `LOWER(column) LIKE pattern`, which behaves the same on SQLite and PostgreSQL.
pub(crate) fn lower_like<C>(column: C, pattern: &str) -> SimpleExpr
where
    C: IntoColumnRef,
{
    Expr::expr(Func::lower(Expr::col(column))).like(pattern)
}
