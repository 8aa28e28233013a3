mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use serde_json::json;

#[tokio::test]
async fn adjust_creates_then_rejects_overdraw() {
    let app = TestApp::new().await;
    let product = app.seed_product("ADJ-1").await;
    let location = app.seed_location("Bay").await;
    let uri = format!("/inventory/{}/{}", product.id, location.id);

    let response = app
        .request(
            Method::POST,
            &format!("{uri}/adjust"),
            Some(json!({ "quantity_change": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["quantity"], 5);
    assert_eq!(body["reorder_point"], 0);

    let response = app
        .request(
            Method::POST,
            &format!("{uri}/adjust"),
            Some(json!({ "quantity_change": -10 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = app.request(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["quantity"], 5);
}

#[tokio::test]
async fn adjust_requires_existing_product_and_location() {
    let app = TestApp::new().await;
    let product = app.seed_product("ADJ-2").await;

    let response = app
        .request(
            Method::POST,
            &format!("/inventory/{}/999/adjust", product.id),
            Some(json!({ "quantity_change": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .request(
            Method::PUT,
            "/inventory/999/999",
            Some(json!({ "quantity": 1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn negative_reorder_point_is_a_validation_error() {
    let app = TestApp::new().await;
    let product = app.seed_product("ADJ-3").await;
    let location = app.seed_location("Shelf").await;

    let response = app
        .request(
            Method::POST,
            &format!("/inventory/{}/{}/adjust", product.id, location.id),
            Some(json!({ "quantity_change": 1, "reorder_point": -1 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn set_stock_accepts_negative_quantities() {
    let app = TestApp::new().await;
    let product = app.seed_product("SET-1").await;
    let location = app.seed_location("Yard").await;
    let uri = format!("/inventory/{}/{}", product.id, location.id);

    let response = app
        .request(
            Method::PUT,
            &uri,
            Some(json!({ "quantity": -3, "reorder_point": 2 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["quantity"], -3);
    assert_eq!(body["is_low_stock"], true);
}

#[tokio::test]
async fn low_stock_report_lists_records_below_reorder_point() {
    let app = TestApp::new().await;
    let product = app.seed_product("LOW-1").await;
    let other = app.seed_product("LOW-2").await;
    let location = app.seed_location("Depot").await;

    for (id, quantity) in [(product.id, 1), (other.id, 10)] {
        let response = app
            .request(
                Method::PUT,
                &format!("/inventory/{}/{}", id, location.id),
                Some(json!({ "quantity": quantity, "reorder_point": 10 })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.request(Method::GET, "/inventory/low-stock", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["sku"], "LOW-1");
    assert_eq!(rows[0]["location_name"], "Depot");
    assert_eq!(rows[0]["shortfall"], 9);
}

#[tokio::test]
async fn delete_and_missing_record() {
    let app = TestApp::new().await;
    let product = app.seed_product("DEL-1").await;
    let location = app.seed_location("Dock").await;
    let uri = format!("/inventory/{}/{}", product.id, location.id);

    let response = app.request(Method::GET, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    app.request(Method::PUT, &uri, Some(json!({ "quantity": 4 })))
        .await;
    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app.request(Method::DELETE, &uri, None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/inventory/1/1", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let header = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .expect("request id header");
    let body = response_json(response).await;
    assert_eq!(body["request_id"], header.as_str());
}

#[tokio::test]
async fn health_and_docs_are_served() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response_json(response).await["status"], "up");

    let response = app.request(Method::GET, "/status", None).await;
    assert_eq!(response_json(response).await["service"], "inventory-api");

    let response = app.request(Method::GET, "/api-docs/openapi.json", None).await;
    assert_eq!(response.status(), StatusCode::OK);
}
