use crate::entities::{inventory_item, location, product};
use crate::handlers::common::{
    created_response, no_content_response, success_response, trimmed, validate_input, ListParams,
};
use crate::repositories::{InventoryRepository, ProductChanges, ProductRepository};
use crate::{db::with_transaction, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Creates the router for product endpoints
pub fn products_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route("/products/", get(list_products).post(create_product))
        .route(
            "/products/:id",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .route("/products/:id/inventory", get(get_product_inventory))
}

fn normalize_optional_string(value: Option<String>) -> Option<String> {
    value.map(trimmed).filter(|v| !v.is_empty())
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 100))]
    pub sku: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub sku: Option<String>,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

impl CreateProductRequest {
    fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            sku: trimmed(self.sku),
            description: normalize_optional_string(self.description),
        }
    }
}

impl UpdateProductRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.map(trimmed),
            sku: self.sku.map(trimmed),
            description: normalize_optional_string(self.description),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductResponse {
    pub id: i32,
    pub name: String,
    pub sku: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<product::Model> for ProductResponse {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            sku: model.sku,
            description: model.description,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductStockEntry {
    pub location_id: i32,
    pub location_name: String,
    pub quantity: i32,
    pub reorder_point: i32,
    pub is_low_stock: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<(inventory_item::Model, location::Model)> for ProductStockEntry {
    fn from((item, location): (inventory_item::Model, location::Model)) -> Self {
        Self {
            is_low_stock: item.is_low_stock(),
            location_id: location.id,
            location_name: location.name,
            quantity: item.quantity,
            reorder_point: item.reorder_point,
            last_updated: item.last_updated,
        }
    }
}

/// Stock of one product across every location
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ProductInventoryResponse {
    pub product_id: i32,
    pub sku: String,
    pub total_quantity: i64,
    pub locations: Vec<ProductStockEntry>,
}

fn product_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Product {} not found", id))
}

/// List products, optionally filtered by name or SKU
#[utoipa::path(
    get,
    path = "/products/",
    params(ListParams),
    responses(
        (status = 200, description = "Products", body = [ProductResponse])
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.clamp_page_size(params.limit);
    let db = state.db.as_ref();

    let products = match params.search_term() {
        Some(term) => ProductRepository::search(db, term, params.skip, limit).await?,
        None => ProductRepository::get_all(db, params.skip, limit).await?,
    };

    let body: Vec<ProductResponse> = products.into_iter().map(Into::into).collect();
    Ok(success_response(body))
}

/// Create a new product
#[utoipa::path(
    post,
    path = "/products/",
    request_body = CreateProductRequest,
    responses(
        (status = 201, description = "Product created", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let CreateProductRequest {
        name,
        sku,
        description,
    } = payload;

    let product = with_transaction(&state.db, move |txn| {
        Box::pin(async move { ProductRepository::create(txn, name, sku, description).await })
    })
    .await?;

    Ok(created_response(ProductResponse::from(product)))
}

/// Get a product by ID
#[utoipa::path(
    get,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product", body = ProductResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let product = ProductRepository::get(state.db.as_ref(), id)
        .await?
        .ok_or_else(|| product_not_found(id))?;

    Ok(success_response(ProductResponse::from(product)))
}

/// Update the provided fields of a product
#[utoipa::path(
    patch,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    request_body = UpdateProductRequest,
    responses(
        (status = 200, description = "Product updated", body = ProductResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "SKU already exists", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn update_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let changes = ProductChanges {
        name: payload.name,
        sku: payload.sku,
        description: payload.description,
    };

    let updated = with_transaction(&state.db, move |txn| {
        Box::pin(async move { ProductRepository::update(txn, id, changes).await })
    })
    .await?
    .ok_or_else(|| product_not_found(id))?;

    Ok(success_response(ProductResponse::from(updated)))
}

/// Delete a product and its stock records
#[utoipa::path(
    delete,
    path = "/products/{id}",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 204, description = "Product deleted"),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_transaction(&state.db, move |txn| {
        Box::pin(async move { ProductRepository::delete(txn, id).await })
    })
    .await?;

    if !deleted {
        return Err(product_not_found(id));
    }
    Ok(no_content_response())
}

/// Stock of a product at every location, with the total
#[utoipa::path(
    get,
    path = "/products/{id}/inventory",
    params(("id" = i32, Path, description = "Product ID")),
    responses(
        (status = 200, description = "Product stock", body = ProductInventoryResponse),
        (status = 404, description = "Product not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Products"
)]
pub async fn get_product_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.as_ref();
    let product = ProductRepository::get(db, id)
        .await?
        .ok_or_else(|| product_not_found(id))?;

    let total_quantity = InventoryRepository::get_total_quantity_by_product(db, id).await?;
    let locations = InventoryRepository::get_by_product(db, id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(success_response(ProductInventoryResponse {
        product_id: product.id,
        sku: product.sku,
        total_quantity,
        locations,
    }))
}
