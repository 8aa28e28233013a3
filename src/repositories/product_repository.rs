use super::{contains_pattern, lower_like};
use crate::entities::{inventory_item, product};
use crate::errors::ServiceError;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use tracing::{info, instrument};

/// Partial update for a product; `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub description: Option<String>,
}

pub struct ProductRepository;

impl ProductRepository {
    #[instrument(skip(db))]
    pub async fn get<C>(db: &C, product_id: i32) -> Result<Option<product::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(product::Entity::find_by_id(product_id).one(db).await?)
    }

    #[instrument(skip(db))]
    pub async fn get_by_sku<C>(db: &C, sku: &str) -> Result<Option<product::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(product::Entity::find()
            .filter(product::Column::Sku.eq(sku))
            .one(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn get_all<C>(
        db: &C,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<product::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        Ok(product::Entity::find()
            .order_by_asc(product::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(db)
            .await?)
    }

    /// Case-insensitive substring match on name or sku.
    #[instrument(skip(db))]
    pub async fn search<C>(
        db: &C,
        term: &str,
        skip: u64,
        limit: u64,
    ) -> Result<Vec<product::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let pattern = contains_pattern(term);

        Ok(product::Entity::find()
            .filter(
                Condition::any()
                    .add(lower_like(product::Column::Name, &pattern))
                    .add(lower_like(product::Column::Sku, &pattern)),
            )
            .order_by_asc(product::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(db)
            .await?)
    }

    #[instrument(skip(db))]
    pub async fn create<C>(
        db: &C,
        name: String,
        sku: String,
        description: Option<String>,
    ) -> Result<product::Model, ServiceError>
    where
        C: ConnectionTrait,
    {
        Self::ensure_unique_sku(db, &sku, None).await?;

        let product = product::ActiveModel {
            name: Set(name),
            sku: Set(sku),
            description: Set(description),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(product_id = product.id, sku = %product.sku, "Product created");
        Ok(product)
    }

    /// Applies only the provided fields. Returns `None` when the id is unknown.
    #[instrument(skip(db))]
    pub async fn update<C>(
        db: &C,
        product_id: i32,
        changes: ProductChanges,
    ) -> Result<Option<product::Model>, ServiceError>
    where
        C: ConnectionTrait,
    {
        let Some(existing) = Self::get(db, product_id).await? else {
            return Ok(None);
        };

        if let Some(sku) = changes.sku.as_deref() {
            Self::ensure_unique_sku(db, sku, Some(product_id)).await?;
        }

        let mut active: product::ActiveModel = existing.clone().into();
        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(sku) = changes.sku {
            active.sku = Set(sku);
        }
        if let Some(description) = changes.description {
            active.description = Set(Some(description));
        }

        if !active.is_changed() {
            return Ok(Some(existing));
        }

        let updated = active.update(db).await?;
        info!(product_id, "Product updated");
        Ok(Some(updated))
    }

    /// Deletes the product and every stock record for it.
    #[instrument(skip(db))]
    pub async fn delete<C>(db: &C, product_id: i32) -> Result<bool, ServiceError>
    where
        C: ConnectionTrait,
    {
        inventory_item::Entity::delete_many()
            .filter(inventory_item::Column::ProductId.eq(product_id))
            .exec(db)
            .await?;

        let result = product::Entity::delete_by_id(product_id).exec(db).await?;
        let deleted = result.rows_affected > 0;
        if deleted {
            info!(product_id, "Product deleted");
        }
        Ok(deleted)
    }

    async fn ensure_unique_sku<C>(
        db: &C,
        sku: &str,
        exclude_id: Option<i32>,
    ) -> Result<(), ServiceError>
    where
        C: ConnectionTrait,
    {
        let mut query = product::Entity::find().filter(product::Column::Sku.eq(sku));
        if let Some(id) = exclude_id {
            query = query.filter(product::Column::Id.ne(id));
        }

        if query.one(db).await?.is_some() {
            return Err(ServiceError::Conflict(format!("SKU {} already exists", sku)));
        }

        Ok(())
    }
}
