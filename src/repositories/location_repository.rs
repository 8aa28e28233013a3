use super::{contains_pattern, lower_like};
use crate::entities::{inventory_item, location};
use crate::errors::ServiceError;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait,
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set,
};
use tracing::{debug, info, instrument};

/// A location together with the summed quantity of all stock held there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationWithStock {
    pub location: location::Model,
    pub total_stock: i64,
}

/// Partial update for a location; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct LocationChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub capacity: Option<i32>,
}

#[derive(Debug, FromQueryResult)]
struct LocationStockRow {
    id: i32,
    name: String,
    address: String,
    capacity: i32,
    total_stock: Option<i64>,
}

impl From<LocationStockRow> for LocationWithStock {
    fn from(row: LocationStockRow) -> Self {
        Self {
            location: location::Model {
                id: row.id,
                name: row.name,
                address: row.address,
                capacity: row.capacity,
            },
            total_stock: row.total_stock.unwrap_or(0),
        }
    }
}

pub struct LocationRepository;

impl LocationRepository {
    #[instrument(skip(db))]
    pub async fn get<C>(db: &C, location_id: i32) -> Result<Option<location::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(location::Entity::find_by_id(location_id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn get_all<C>(
        db: &C,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<location::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(location::Entity::find()
            .order_by_asc(location::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(db)
            .await?)
    }

    /// Case-insensitive substring match on name or address.
    #[instrument(skip(db))]
    pub async fn search<C>(
        db: &C,
        term: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<location::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let pattern = contains_pattern(term);

        Ok(location::Entity::find()
            .filter(
                Condition::any()
                    .add(lower_like(location::Column::Name, &pattern))
                    .add(lower_like(location::Column::Address, &pattern)),
            )
            .order_by_asc(location::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(db)
            .await?)
    }

    /// Sum of quantities held at a location; 0 when it holds nothing.
    #[instrument(skip(db))]
    pub async fn total_stock<C>(db: &C, location_id: i32) -> Result<i64, ServiceError>
    where
        C: ConnectionTrait,
    {
        let total = inventory_item::Entity::find()
            .select_only()
            .column_as(Expr::col(inventory_item::Column::Quantity).sum(), "total")
            .filter(inventory_item::Column::LocationId.eq(location_id))
            .into_tuple::<Option<i64>>()
            .one(db)
            .await?;

        Ok(total.flatten().unwrap_or(0))
    }

    #[instrument(skip(db))]
    pub async fn get_with_stock_count<C>(
        db: &C,
        location_id: i32,
    ) -> Result<Option<LocationWithStock>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let Some(location) = Self::get(db, location_id).await? else {
            return Ok(None);
        };
        let total_stock = Self::total_stock(db, location_id).await?;

        Ok(Some(LocationWithStock {
            location,
            total_stock,
        }))
    }

    /// One page of locations with their stock totals, computed in a single
    /// grouped query.
    #[instrument(skip(db))]
    pub async fn get_all_with_stock_counts<C>(
        db: &C,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<LocationWithStock>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let rows = location::Entity::find()
            .select_only()
            .column(location::Column::Id)
            .column(location::Column::Name)
            .column(location::Column::Address)
            .column(location::Column::Capacity)
            .column_as(
                Expr::col((inventory_item::Entity, inventory_item::Column::Quantity)).sum(),
                "total_stock",
            )
            .join(JoinType::LeftJoin, location::Relation::InventoryItems.def())
            .group_by(location::Column::Id)
            .group_by(location::Column::Name)
            .group_by(location::Column::Address)
            .group_by(location::Column::Capacity)
            .order_by_asc(location::Column::Id)
            .offset(skip)
            .limit(limit)
            .into_model::<LocationStockRow>()
            .all(db)
            .await?;

        debug!(count = rows.len(), "Loaded locations with stock totals");
        Ok(rows.into_iter().map(LocationWithStock::from).collect())
    }

    #[instrument(skip(db))]
    pub async fn create<C>(
        db: &C,
        name: String,
        address: String,
        capacity: i32,
    ) -> Result<location::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        let location = location::ActiveModel {
            name: Set(name),
            address: Set(address),
            capacity: Set(capacity),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(location_id = location.id, "Location created");
        Ok(location)
    }

    /// Applies only the provided fields. Returns `None` when the id is unknown.
    #[instrument(skip(db))]
    pub async fn update<C>(
        db: &C,
        location_id: i32,
        changes: LocationChanges,
    ) -> Result<Option<location::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let Some(existing) = Self::get(db, location_id).await? else {
            return Ok(None);
        };

        let mut active: location::ActiveModel = existing.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(address) = changes.address {
            active.address = Set(address);
        }
        if let Some(capacity) = changes.capacity {
            active.capacity = Set(capacity);
        }

        if !active.is_changed() {
            return Ok(Some(existing));
        }

        let updated = active.update(db).await?;
        info!(location_id, "Location updated");
        Ok(Some(updated))
    }

    /// Deletes the location and every stock record held there.
    #[instrument(skip(db))]
    pub async fn delete<C>(db: &C, location_id: i32) -> Result<bool, ServiceError>
    where
        C: ConnectionTrait,
    {
        let removed_stock = inventory_item::Entity::delete_many()
            .filter(inventory_item::Column::LocationId.eq(location_id))
            .exec(db)
            .await?;

        let result = location::Entity::delete_by_id(location_id)
            .exec(db)
            .await?;

        let deleted = result.rows_affected > 0;
        if deleted {
            info!(
                location_id,
                stock_records = removed_stock.rows_affected,
                "Location deleted"
            );
        }
        Ok(deleted)
    }
}
