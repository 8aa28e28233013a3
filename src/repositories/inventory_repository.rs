use crate::entities::{inventory_item, location, product};
use crate::errors::ServiceError;
use chrono::Utc;
use metrics::counter;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use std::collections::HashMap;
use tracing::{info, instrument, warn};

/// Stock record joined with both the product and the location it refers to.
pub type LowStockRow = (inventory_item::Model, product::Model, location::Model);

pub struct InventoryRepository;

impl InventoryRepository {
    #[instrument(skip(db))]
    pub async fn get<C>(
        db: &C,
        product_id: i32,
        location_id: i32,
    ) -> Result<Option<inventory_item::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(inventory_item::Entity::find_by_id((product_id, location_id))
            .one(db)
            .await?)
    }

    /// Every stock record of a product, each with its location.
    #[instrument(skip(db))]
    pub async fn get_by_product<C>(
        db: &C,
        product_id: i32,
    ) -> Result<Vec<(inventory_item::Model, location::Model)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = inventory_item::Entity::find()
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .order_by_asc(inventory_item::Column::LocationId)
            .find_also_related(location::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, location)| location.map(|location| (item, location)))
            .collect())
    }

    /// Every stock record held at a location, each with its product.
    #[instrument(skip(db))]
    pub async fn get_by_location<C>(
        db: &C,
        location_id: i32,
    ) -> Result<Vec<(inventory_item::Model, product::Model)>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = inventory_item::Entity::find()
            .filter(inventory_item::Column::LocationId.eq(location_id))
            .order_by_asc(inventory_item::Column::ProductId)
            .find_also_related(product::Entity)
            .all(db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| product.map(|product| (item, product)))
            .collect())
    }

    /// Records whose quantity is strictly below their reorder point.
    #[instrument(skip(db))]
    pub async fn get_low_stock_items<C>(db: &C) -> Result<Vec<LowStockRow>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = inventory_item::Entity::find()
            .filter(
                Expr::col((inventory_item::Entity, inventory_item::Column::Quantity)).lt(
                    Expr::col((inventory_item::Entity, inventory_item::Column::ReorderPoint)),
                ),
            )
            .order_by_asc(inventory_item::Column::ProductId)
            .order_by_asc(inventory_item::Column::LocationId)
            .find_also_related(product::Entity)
            .all(db)
            .await?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut location_ids: Vec<i32> = rows.iter().map(|(item, _)| item.location_id).collect();
        location_ids.sort_unstable();
        location_ids.dedup();

        let locations: HashMap<i32, location::Model> = location::Entity::find()
            .filter(location::Column::Id.is_in(location_ids))
            .all(db)
            .await?
            .into_iter()
            .map(|location| (location.id, location))
            .collect();

        Ok(rows
            .into_iter()
            .filter_map(|(item, product)| {
                let product = product?;
                let location = locations.get(&item.location_id)?.clone();
                Some((item, product, location))
            })
            .collect())
    }

    /// Sum of a product's quantity across all locations; 0 when it has no records.
    #[instrument(skip(db))]
    pub async fn get_total_quantity_by_product<C>(
        db: &C,
        product_id: i32,
    ) -> Result<i64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let total = inventory_item::Entity::find()
            .select_only()
            .column_as(Expr::col(inventory_item::Column::Quantity).sum(), "total")
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?;

        Ok(total.flatten().unwrap_or(0))
    }

    /// Applies a relative stock movement.
    ///
    /// An existing record is changed with a single conditional `UPDATE`, so a
    /// movement that would leave the quantity negative touches nothing and
    /// fails with [`ServiceError::InsufficientStock`]. A missing record is
    /// created only for non-negative movements, with `reorder_point`
    /// defaulting to 0.
    #[instrument(skip(db))]
    pub async fn update_stock<C>(
        db: &C,
        product_id: i32,
        location_id: i32,
        quantity_change: i32,
        reorder_point: Option<i32>,
    ) -> Result<inventory_item::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let Some(current) = Self::get(db, product_id, location_id).await? else {
            if quantity_change < 0 {
                return Err(Self::reject(product_id, location_id, 0, quantity_change));
            }

            let created = inventory_item::ActiveModel {
                product_id: Set(product_id),
                location_id: Set(location_id),
                quantity: Set(quantity_change),
                reorder_point: Set(reorder_point.unwrap_or(0)),
                ..Default::default()
            }
            .insert(db)
            .await?;

            info!(
                product_id,
                location_id,
                quantity = created.quantity,
                "Stock record created"
            );
            return Ok(created);
        };

        // 0 <= quantity + change <= i32::MAX, checked by the UPDATE itself
        let bound = if quantity_change >= 0 {
            inventory_item::Column::Quantity.lte(i32::MAX - quantity_change)
        } else {
            let Some(floor) = quantity_change.checked_neg() else {
                return Err(Self::reject(
                    product_id,
                    location_id,
                    current.quantity,
                    quantity_change,
                ));
            };
            inventory_item::Column::Quantity.gte(floor)
        };

        let mut update = inventory_item::Entity::update_many()
            .col_expr(
                inventory_item::Column::Quantity,
                Expr::col(inventory_item::Column::Quantity).add(quantity_change),
            )
            .col_expr(inventory_item::Column::LastUpdated, Expr::value(Utc::now()))
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .filter(inventory_item::Column::LocationId.eq(location_id))
            .filter(bound);
        if let Some(reorder_point) = reorder_point {
            update = update.col_expr(
                inventory_item::Column::ReorderPoint,
                Expr::value(reorder_point),
            );
        }

        let result = update.exec(db).await?;
        if result.rows_affected == 0 {
            let latest = Self::get(db, product_id, location_id)
                .await?
                .ok_or_else(|| Self::missing(product_id, location_id))?;

            if quantity_change >= 0 {
                return Err(ServiceError::InvalidInput(format!(
                    "quantity change {} overflows the stock of product {} at location {}",
                    quantity_change, product_id, location_id
                )));
            }
            return Err(Self::reject(
                product_id,
                location_id,
                latest.quantity,
                quantity_change,
            ));
        }

        let updated = Self::get(db, product_id, location_id)
            .await?
            .ok_or_else(|| Self::missing(product_id, location_id))?;

        info!(
            product_id,
            location_id,
            quantity_change,
            quantity = updated.quantity,
            "Stock adjusted"
        );
        Ok(updated)
    }

    /// Overwrites (or creates) the record with an absolute quantity.
    ///
    /// No sign check is made here, unlike [`Self::update_stock`]: a negative
    /// `quantity` is stored as given.
    #[instrument(skip(db))]
    pub async fn set_stock<C>(
        db: &C,
        product_id: i32,
        location_id: i32,
        quantity: i32,
        reorder_point: Option<i32>,
    ) -> Result<inventory_item::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let item = match Self::get(db, product_id, location_id).await? {
            Some(existing) => {
                let mut active: inventory_item::ActiveModel = existing.into();
                active.quantity = Set(quantity);
                if let Some(reorder_point) = reorder_point {
                    active.reorder_point = Set(reorder_point);
                }
                active.update(db).await?
            }
            None => {
                inventory_item::ActiveModel {
                    product_id: Set(product_id),
                    location_id: Set(location_id),
                    quantity: Set(quantity),
                    reorder_point: Set(reorder_point.unwrap_or(0)),
                    ..Default::default()
                }
                .insert(db)
                .await?
            }
        };

        info!(product_id, location_id, quantity, "Stock set");
        Ok(item)
    }

    /// Returns whether a record was removed.
    #[instrument(skip(db))]
    pub async fn delete<C>(db: &C, product_id: i32, location_id: i32) -> Result<bool, ServiceError>
    where
        C: ConnectionTrait,
    {
        let result = inventory_item::Entity::delete_by_id((product_id, location_id))
            .exec(db)
            .await?;

        Ok(result.rows_affected > 0)
    }

    fn reject(product_id: i32, location_id: i32, available: i32, change: i32) -> ServiceError {
        counter!("inventory_db.stock.rejected", 1);
        warn!(product_id, location_id, available, change, "Stock movement rejected");
        ServiceError::InsufficientStock(format!(
            "product {} at location {} has {}, cannot apply {}",
            product_id, location_id, available, change
        ))
    }

    fn missing(product_id: i32, location_id: i32) -> ServiceError {
        ServiceError::NotFound(format!(
            "Stock record for product {} at location {} not found",
            product_id, location_id
        ))
    }
}
