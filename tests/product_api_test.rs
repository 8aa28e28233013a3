mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use inventory_api::repositories::InventoryRepository;
use serde_json::json;

#[tokio::test]
async fn create_get_and_conflict_on_duplicate_sku() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/products/",
            Some(json!({ "name": " Widget ", "sku": "WID-1", "description": "Blue" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = response_json(response).await;
    assert_eq!(created["name"], "Widget");
    let id = created["id"].as_i64().unwrap();

    let response = app
        .request(Method::GET, &format!("/products/{}", id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["sku"], "WID-1");

    let response = app
        .request(
            Method::POST,
            "/products",
            Some(json!({ "name": "Other", "sku": "WID-1" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn blank_fields_are_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/products/",
            Some(json!({ "name": "   ", "sku": "SKU" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(Method::POST, "/products/", Some(json!({ "name": "A" })))
        .await;
    assert!(response.status().is_client_error());
}

#[tokio::test]
async fn search_matches_name_or_sku() {
    let app = TestApp::new().await;
    app.seed_product("ALPHA-1").await;
    app.seed_product("BETA-2").await;

    let response = app.request(Method::GET, "/products/?search=alpha", None).await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["sku"], "ALPHA-1");

    let response = app.request(Method::GET, "/products/?limit=1", None).await;
    assert_eq!(response_json(response).await.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patch_and_delete() {
    let app = TestApp::new().await;
    let product = app.seed_product("PATCH-1").await;

    let response = app
        .request(
            Method::PATCH,
            &format!("/products/{}", product.id),
            Some(json!({ "description": "Updated" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["description"], "Updated");
    assert_eq!(body["sku"], "PATCH-1");

    let response = app
        .request(Method::DELETE, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request(Method::GET, &format!("/products/{}", product.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn product_inventory_reports_total_across_locations() {
    let app = TestApp::new().await;
    let product = app.seed_product("TOTAL-1").await;
    let first = app.seed_location("First").await;
    let second = app.seed_location("Second").await;

    let response = app
        .request(
            Method::GET,
            &format!("/products/{}/inventory", product.id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["total_quantity"], 0);
    assert!(body["locations"].as_array().unwrap().is_empty());

    InventoryRepository::set_stock(app.db(), product.id, first.id, 8, None)
        .await
        .unwrap();
    InventoryRepository::set_stock(app.db(), product.id, second.id, 12, None)
        .await
        .unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/products/{}/inventory", product.id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["total_quantity"], 20);
    assert_eq!(body["locations"].as_array().unwrap().len(), 2);
    assert_eq!(body["locations"][0]["location_name"], "First");
}
