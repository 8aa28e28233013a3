use crate::entities::inventory_item;
use crate::errors::ServiceError;
use crate::handlers::common::{no_content_response, success_response, validate_input};
use crate::repositories::{
    inventory_repository::LowStockRow, InventoryRepository, LocationRepository, ProductRepository,
};
use crate::{db::with_transaction, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::ConnectionTrait;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for inventory endpoints
pub fn inventory_routes() -> Router<AppState> {
    Router::new()
        .route("/inventory/low-stock", get(get_low_stock_items))
        .route(
            "/inventory/:product_id/:location_id",
            get(get_inventory_item)
                .put(set_stock)
                .delete(delete_inventory_item),
        )
        .route(
            "/inventory/:product_id/:location_id/adjust",
            post(adjust_stock),
        )
}

/// Relative stock movement; negative values remove stock.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct AdjustStockRequest {
    pub quantity_change: i32,
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
}

/// Absolute stock level. The quantity sign is not checked.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SetStockRequest {
    pub quantity: i32,
    #[validate(range(min = 0))]
    pub reorder_point: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct InventoryItemResponse {
    pub product_id: i32,
    pub location_id: i32,
    pub quantity: i32,
    pub reorder_point: i32,
    pub is_low_stock: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<inventory_item::Model> for InventoryItemResponse {
    fn from(model: inventory_item::Model) -> Self {
        Self {
            is_low_stock: model.is_low_stock(),
            product_id: model.product_id,
            location_id: model.location_id,
            quantity: model.quantity,
            reorder_point: model.reorder_point,
            last_updated: model.last_updated,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LowStockResponse {
    pub product_id: i32,
    pub product_name: String,
    pub sku: String,
    pub location_id: i32,
    pub location_name: String,
    pub quantity: i32,
    pub reorder_point: i32,
    /// Units needed to reach the reorder point
    pub shortfall: i64,
}

impl From<LowStockRow> for LowStockResponse {
    fn from((item, product, location): LowStockRow) -> Self {
        Self {
            shortfall: i64::from(item.reorder_point) - i64::from(item.quantity),
            product_id: product.id,
            product_name: product.name,
            sku: product.sku,
            location_id: location.id,
            location_name: location.name,
            quantity: item.quantity,
            reorder_point: item.reorder_point,
        }
    }
}

fn record_not_found(product_id: i32, location_id: i32) -> ApiError {
    ApiError::NotFound(format!(
        "No stock record for product {} at location {}",
        product_id, location_id
    ))
}

/// Both ends of a stock record must exist before it is written.
async fn ensure_product_and_location<C>(
    db: &C,
    product_id: i32,
    location_id: i32,
) -> Result<(), ServiceError>
where
    C: ConnectionTrait,
{
    if ProductRepository::get(db, product_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "Product {} not found",
            product_id
        )));
    }
    if LocationRepository::get(db, location_id).await?.is_none() {
        return Err(ServiceError::NotFound(format!(
            "Location {} not found",
            location_id
        )));
    }
    Ok(())
}

/// Stock records below their reorder point
#[utoipa::path(
    get,
    path = "/inventory/low-stock",
    responses(
        (status = 200, description = "Low stock records", body = [LowStockResponse])
    ),
    tag = "Inventory"
)]
pub async fn get_low_stock_items(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let rows = InventoryRepository::get_low_stock_items(state.db.as_ref()).await?;
    let body: Vec<LowStockResponse> = rows.into_iter().map(Into::into).collect();
    Ok(success_response(body))
}

/// Get the stock record of a product at a location
#[utoipa::path(
    get,
    path = "/inventory/{product_id}/{location_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("location_id" = i32, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Stock record", body = InventoryItemResponse),
        (status = 404, description = "No stock record", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn get_inventory_item(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let item = InventoryRepository::get(state.db.as_ref(), product_id, location_id)
        .await?
        .ok_or_else(|| record_not_found(product_id, location_id))?;

    Ok(success_response(InventoryItemResponse::from(item)))
}

/// Apply a relative stock movement
#[utoipa::path(
    post,
    path = "/inventory/{product_id}/{location_id}/adjust",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("location_id" = i32, Path, description = "Location ID")
    ),
    request_body = AdjustStockRequest,
    responses(
        (status = 200, description = "Stock adjusted", body = InventoryItemResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or location not found", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn adjust_stock(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(i32, i32)>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let AdjustStockRequest {
        quantity_change,
        reorder_point,
    } = payload;

    let item = with_transaction(&state.db, move |txn| {
        Box::pin(async move {
            ensure_product_and_location(txn, product_id, location_id).await?;
            InventoryRepository::update_stock(
                txn,
                product_id,
                location_id,
                quantity_change,
                reorder_point,
            )
            .await
        })
    })
    .await?;

    Ok(success_response(InventoryItemResponse::from(item)))
}

/// Overwrite the stock level of a product at a location
#[utoipa::path(
    put,
    path = "/inventory/{product_id}/{location_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("location_id" = i32, Path, description = "Location ID")
    ),
    request_body = SetStockRequest,
    responses(
        (status = 200, description = "Stock set", body = InventoryItemResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product or location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn set_stock(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(i32, i32)>,
    Json(payload): Json<SetStockRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&payload)?;

    let SetStockRequest {
        quantity,
        reorder_point,
    } = payload;

    let item = with_transaction(&state.db, move |txn| {
        Box::pin(async move {
            ensure_product_and_location(txn, product_id, location_id).await?;
            InventoryRepository::set_stock(txn, product_id, location_id, quantity, reorder_point)
                .await
        })
    })
    .await?;

    Ok(success_response(InventoryItemResponse::from(item)))
}

/// Remove the stock record of a product at a location
#[utoipa::path(
    delete,
    path = "/inventory/{product_id}/{location_id}",
    params(
        ("product_id" = i32, Path, description = "Product ID"),
        ("location_id" = i32, Path, description = "Location ID")
    ),
    responses(
        (status = 204, description = "Stock record deleted"),
        (status = 404, description = "No stock record", body = crate::errors::ErrorResponse)
    ),
    tag = "Inventory"
)]
pub async fn delete_inventory_item(
    State(state): State<AppState>,
    Path((product_id, location_id)): Path<(i32, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_transaction(&state.db, move |txn| {
        Box::pin(async move { InventoryRepository::delete(txn, product_id, location_id).await })
    })
    .await?;

    if !deleted {
        return Err(record_not_found(product_id, location_id));
    }
    Ok(no_content_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_reorder_point_is_rejected() {
        let request = AdjustStockRequest {
            quantity_change: 5,
            reorder_point: Some(-1),
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn negative_quantities_pass_request_validation() {
        let adjust = AdjustStockRequest {
            quantity_change: -20,
            reorder_point: None,
        };
        assert!(adjust.validate().is_ok());

        let set = SetStockRequest {
            quantity: -3,
            reorder_point: Some(0),
        };
        assert!(set.validate().is_ok());
    }

    #[test]
    fn shortfall_does_not_overflow() {
        let row: LowStockRow = (
            inventory_item::Model {
                product_id: 1,
                location_id: 2,
                quantity: i32::MIN,
                reorder_point: i32::MAX,
                last_updated: Utc::now(),
            },
            crate::entities::product::Model {
                id: 1,
                name: "Widget".into(),
                sku: "WID-1".into(),
                description: None,
                created_at: Utc::now(),
                updated_at: None,
            },
            crate::entities::location::Model {
                id: 2,
                name: "Dock".into(),
                address: "1 Quay Street".into(),
                capacity: 10,
            },
        );
        let response = LowStockResponse::from(row);
        assert_eq!(
            response.shortfall,
            i64::from(i32::MAX) - i64::from(i32::MIN)
        );
    }
}
