use crate::handlers::{health, inventory, locations, products};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Inventory API",
        version = "0.1.0",
        description = r#"
# Inventory API

Tracks products, storage locations and the stock of each product held at each location.

## Stock records

A stock record is keyed by `(product_id, location_id)`. Relative movements go through
`POST /inventory/{product_id}/{location_id}/adjust` and never drive a quantity below zero;
such a movement is rejected with `422 Unprocessable Entity` and leaves the record untouched.
`PUT /inventory/{product_id}/{location_id}` overwrites the quantity as given.

## Error Handling

Errors share one body:

```json
{
  "error": "Not Found",
  "message": "Location 42 not found",
  "request_id": "5f0c3c1e-...",
  "timestamp": "2024-01-01T00:00:00Z"
}
```

## Pagination

List endpoints take `skip` (default 0) and `limit` (default 100, capped by configuration).
"#
    ),
    paths(
        locations::list_locations,
        locations::create_location,
        locations::list_locations_with_stock,
        locations::get_location,
        locations::update_location,
        locations::delete_location,
        locations::get_location_inventory,
        products::list_products,
        products::create_product,
        products::get_product,
        products::update_product,
        products::delete_product,
        products::get_product_inventory,
        inventory::get_low_stock_items,
        inventory::get_inventory_item,
        inventory::adjust_stock,
        inventory::set_stock,
        inventory::delete_inventory_item,
        health::health_check,
        health::api_status,
    ),
    components(
        schemas(
            crate::errors::ErrorResponse,
            locations::CreateLocationRequest,
            locations::UpdateLocationRequest,
            locations::LocationResponse,
            locations::LocationWithStockResponse,
            locations::LocationInventoryEntry,
            products::CreateProductRequest,
            products::UpdateProductRequest,
            products::ProductResponse,
            products::ProductStockEntry,
            products::ProductInventoryResponse,
            inventory::AdjustStockRequest,
            inventory::SetStockRequest,
            inventory::InventoryItemResponse,
            inventory::LowStockResponse,
            health::ComponentStatus,
            health::ComponentHealth,
            health::HealthResponse,
            health::StatusResponse,
        )
    ),
    tags(
        (name = "Locations", description = "Storage locations"),
        (name = "Products", description = "Product catalog"),
        (name = "Inventory", description = "Stock records per product and location"),
        (name = "Health", description = "Liveness and status"),
    )
)]
pub struct ApiDoc;

/// Swagger UI served at `/swagger-ui`, document at `/api-docs/openapi.json`
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_resource() {
        let openapi = ApiDoc::openapi();
        let paths = &openapi.paths.paths;
        for path in [
            "/locations/",
            "/locations/with-stock",
            "/locations/{id}",
            "/locations/{id}/inventory",
            "/products/",
            "/products/{id}/inventory",
            "/inventory/low-stock",
            "/inventory/{product_id}/{location_id}",
            "/inventory/{product_id}/{location_id}/adjust",
            "/health",
        ] {
            assert!(paths.contains_key(path), "missing {path}");
        }
    }
}
