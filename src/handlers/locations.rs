use crate::entities::{inventory_item, location, product};
use crate::handlers::common::{
    created_response, no_content_response, success_response, trimmed, validate_input, ListParams,
};
use crate::repositories::{
    InventoryRepository, LocationChanges, LocationRepository, LocationWithStock,
};
use crate::{db::with_transaction, errors::ApiError, AppState};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

/// Creates the router for location endpoints
pub fn locations_routes() -> Router<AppState> {
    Router::new()
        .route("/locations", get(list_locations).post(create_location))
        .route("/locations/", get(list_locations).post(create_location))
        .route("/locations/with-stock", get(list_locations_with_stock))
        .route(
            "/locations/:id",
            get(get_location)
                .patch(update_location)
                .delete(delete_location),
        )
        .route("/locations/:id/inventory", get(get_location_inventory))
}

#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct CreateLocationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(min = 5, max = 200))]
    pub address: String,
    /// Must be strictly positive
    #[validate(range(min = 1))]
    pub capacity: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, Validate, ToSchema)]
pub struct UpdateLocationRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    #[validate(length(min = 5, max = 200))]
    pub address: Option<String>,
    #[validate(range(min = 1))]
    pub capacity: Option<i32>,
}

impl CreateLocationRequest {
    fn normalized(self) -> Self {
        Self {
            name: trimmed(self.name),
            address: trimmed(self.address),
            capacity: self.capacity,
        }
    }
}

impl UpdateLocationRequest {
    fn normalized(self) -> Self {
        Self {
            name: self.name.map(trimmed),
            address: self.address.map(trimmed),
            capacity: self.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationResponse {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub capacity: i32,
}

impl From<location::Model> for LocationResponse {
    fn from(model: location::Model) -> Self {
        Self {
            id: model.id,
            name: model.name,
            address: model.address,
            capacity: model.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationWithStockResponse {
    pub id: i32,
    pub name: String,
    pub address: String,
    pub capacity: i32,
    /// Sum of all quantities held at the location
    pub total_stock: i64,
}

impl From<LocationWithStock> for LocationWithStockResponse {
    fn from(row: LocationWithStock) -> Self {
        Self {
            id: row.location.id,
            name: row.location.name,
            address: row.location.address,
            capacity: row.location.capacity,
            total_stock: row.total_stock,
        }
    }
}

/// One stock record at a location, with the product it counts.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationInventoryEntry {
    pub product_id: i32,
    pub product_name: String,
    pub sku: String,
    pub quantity: i32,
    pub reorder_point: i32,
    pub is_low_stock: bool,
    pub last_updated: DateTime<Utc>,
}

impl From<(inventory_item::Model, product::Model)> for LocationInventoryEntry {
    fn from((item, product): (inventory_item::Model, product::Model)) -> Self {
        Self {
            is_low_stock: item.is_low_stock(),
            product_id: product.id,
            product_name: product.name,
            sku: product.sku,
            quantity: item.quantity,
            reorder_point: item.reorder_point,
            last_updated: item.last_updated,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageParams {
    #[serde(default)]
    pub skip: u64,
    pub limit: Option<u64>,
}

fn location_not_found(id: i32) -> ApiError {
    ApiError::NotFound(format!("Location {} not found", id))
}

/// List locations, optionally filtered by name or address
#[utoipa::path(
    get,
    path = "/locations/",
    params(ListParams),
    responses(
        (status = 200, description = "Locations", body = [LocationResponse])
    ),
    tag = "Locations"
)]
pub async fn list_locations(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.clamp_page_size(params.limit);
    let db = state.db.as_ref();

    let locations = match params.search_term() {
        Some(term) => LocationRepository::search(db, term, params.skip, limit).await?,
        None => LocationRepository::get_all(db, params.skip, limit).await?,
    };

    let body: Vec<LocationResponse> = locations.into_iter().map(Into::into).collect();
    Ok(success_response(body))
}

/// Create a location
#[utoipa::path(
    post,
    path = "/locations/",
    request_body = CreateLocationRequest,
    responses(
        (status = 201, description = "Location created", body = LocationResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn create_location(
    State(state): State<AppState>,
    Json(payload): Json<CreateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let CreateLocationRequest {
        name,
        address,
        capacity,
    } = payload;

    let location = with_transaction(&state.db, move |txn| {
        Box::pin(async move { LocationRepository::create(txn, name, address, capacity).await })
    })
    .await?;

    Ok(created_response(LocationResponse::from(location)))
}

/// List locations with the total stock held at each
#[utoipa::path(
    get,
    path = "/locations/with-stock",
    params(PageParams),
    responses(
        (status = 200, description = "Locations with stock totals", body = [LocationWithStockResponse])
    ),
    tag = "Locations"
)]
pub async fn list_locations_with_stock(
    State(state): State<AppState>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, ApiError> {
    let limit = state.config.clamp_page_size(params.limit);
    let rows =
        LocationRepository::get_all_with_stock_counts(state.db.as_ref(), params.skip, limit)
            .await?;

    let body: Vec<LocationWithStockResponse> = rows.into_iter().map(Into::into).collect();
    Ok(success_response(body))
}

/// Get a location with its stock total
#[utoipa::path(
    get,
    path = "/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Location", body = LocationWithStockResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn get_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let row = LocationRepository::get_with_stock_count(state.db.as_ref(), id)
        .await?
        .ok_or_else(|| location_not_found(id))?;

    Ok(success_response(LocationWithStockResponse::from(row)))
}

/// Update the provided fields of a location
#[utoipa::path(
    patch,
    path = "/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    request_body = UpdateLocationRequest,
    responses(
        (status = 200, description = "Location updated", body = LocationResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn update_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateLocationRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let payload = payload.normalized();
    validate_input(&payload)?;

    let changes = LocationChanges {
        name: payload.name,
        address: payload.address,
        capacity: payload.capacity,
    };

    let updated = with_transaction(&state.db, move |txn| {
        Box::pin(async move { LocationRepository::update(txn, id, changes).await })
    })
    .await?
    .ok_or_else(|| location_not_found(id))?;

    Ok(success_response(LocationResponse::from(updated)))
}

/// Delete a location and all stock held there
#[utoipa::path(
    delete,
    path = "/locations/{id}",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 204, description = "Location deleted"),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn delete_location(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let deleted = with_transaction(&state.db, move |txn| {
        Box::pin(async move { LocationRepository::delete(txn, id).await })
    })
    .await?;

    if !deleted {
        return Err(location_not_found(id));
    }
    Ok(no_content_response())
}

/// List the stock records held at a location
#[utoipa::path(
    get,
    path = "/locations/{id}/inventory",
    params(("id" = i32, Path, description = "Location ID")),
    responses(
        (status = 200, description = "Stock at the location", body = [LocationInventoryEntry]),
        (status = 404, description = "Location not found", body = crate::errors::ErrorResponse)
    ),
    tag = "Locations"
)]
pub async fn get_location_inventory(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.db.as_ref();
    if LocationRepository::get(db, id).await?.is_none() {
        return Err(location_not_found(id));
    }

    let entries: Vec<LocationInventoryEntry> = InventoryRepository::get_by_location(db, id)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(success_response(entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn create_request(capacity: i32) -> CreateLocationRequest {
        CreateLocationRequest {
            name: "North Warehouse".into(),
            address: "12 Harbour Road".into(),
            capacity,
        }
    }

    #[rstest]
    #[case(-1, false)]
    #[case(0, false)]
    #[case(1, true)]
    #[case(50_000, true)]
    fn capacity_must_be_positive(#[case] capacity: i32, #[case] valid: bool) {
        assert_eq!(create_request(capacity).validate().is_ok(), valid);
    }

    #[rstest]
    #[case("", false)]
    #[case("A", true)]
    fn name_length_is_bounded(#[case] name: &str, #[case] valid: bool) {
        let mut request = create_request(10);
        request.name = name.into();
        assert_eq!(request.validate().is_ok(), valid);

        request.name = "n".repeat(101);
        assert!(request.validate().is_err());
    }

    #[test]
    fn short_address_is_rejected() {
        let mut request = create_request(10);
        request.address = "1 Rd".into();
        assert!(request.validate().is_err());
    }

    #[test]
    fn padding_does_not_count_towards_length() {
        let mut request = create_request(10);
        request.name = "  Dock 7  ".into();
        request.address = "    x".into();

        let request = request.normalized();
        assert_eq!(request.name, "Dock 7");
        assert_eq!(request.address, "x");
        assert!(request.validate().is_err());

        let update = UpdateLocationRequest {
            name: Some("   ".into()),
            ..Default::default()
        }
        .normalized();
        assert!(update.validate().is_err());
    }

    #[test]
    fn update_request_checks_only_present_fields() {
        assert!(UpdateLocationRequest::default().validate().is_ok());

        let request = UpdateLocationRequest {
            capacity: Some(0),
            ..Default::default()
        };
        assert!(request.validate().is_err());
    }
}
