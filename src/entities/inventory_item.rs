use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveModelBehavior, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};

/// Stock record: the quantity of one product held at one location.
///
/// Identity is the `(product_id, location_id)` pair, so there is at most one
/// record per product and location.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inventory_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i32,
    #[sea_orm(primary_key, auto_increment = false)]
    pub location_id: i32,
    pub quantity: i32,
    /// Threshold below which the record counts as low stock
    pub reorder_point: i32,
    pub last_updated: DateTime<Utc>,
}

impl Model {
    /// Low stock means strictly below the reorder point.
    pub fn is_low_stock(&self) -> bool {
        self.quantity < self.reorder_point
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::location::Entity",
        from = "Column::LocationId",
        to = "super::location::Column::Id",
        on_delete = "Cascade"
    )]
    Location,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::location::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Location.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        active_model.last_updated = Set(Utc::now());
        Ok(active_model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i32, reorder_point: i32) -> Model {
        Model {
            product_id: 1,
            location_id: 1,
            quantity,
            reorder_point,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_strictly_below_reorder_point() {
        assert!(item(4, 5).is_low_stock());
        assert!(!item(5, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
        assert!(!item(0, 0).is_low_stock());
    }
}
