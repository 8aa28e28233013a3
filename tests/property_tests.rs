//! Property-based tests for stock arithmetic and request validation.

mod common;

use chrono::Utc;
use inventory_api::{
    config::AppConfig,
    entities::inventory_item,
    handlers::{inventory::AdjustStockRequest, locations::CreateLocationRequest},
    repositories::{InventoryRepository, LocationRepository, ProductRepository},
};
use proptest::prelude::*;
use validator::Validate;

fn movement_strategy() -> impl Strategy<Value = Vec<i32>> {
    prop::collection::vec(-50i32..50, 1..20)
}

fn stock_record(quantity: i32, reorder_point: i32) -> inventory_item::Model {
    inventory_item::Model {
        product_id: 1,
        location_id: 1,
        quantity,
        reorder_point,
        last_updated: Utc::now(),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn low_stock_iff_strictly_below_reorder_point(quantity in -1_000i32..1_000, reorder_point in 0i32..1_000) {
        let item = stock_record(quantity, reorder_point);
        prop_assert_eq!(item.is_low_stock(), quantity < reorder_point);
    }

    #[test]
    fn location_capacity_validation_matches_sign(capacity in any::<i32>()) {
        let request = CreateLocationRequest {
            name: "Depot".into(),
            address: "22 Canal Street".into(),
            capacity,
        };
        prop_assert_eq!(request.validate().is_ok(), capacity >= 1);
    }

    #[test]
    fn reorder_point_validation_matches_sign(reorder_point in any::<i32>(), change in any::<i32>()) {
        let request = AdjustStockRequest {
            quantity_change: change,
            reorder_point: Some(reorder_point),
        };
        prop_assert_eq!(request.validate().is_ok(), reorder_point >= 0);
    }

    #[test]
    fn page_size_is_always_within_bounds(requested in proptest::option::of(any::<u64>())) {
        let cfg = AppConfig::new("sqlite::memory:".into(), "127.0.0.1".into(), 8080, "development".into());
        let size = cfg.clamp_page_size(requested);
        prop_assert!(size <= cfg.api_max_page_size);
        if let Some(requested) = requested {
            prop_assert_eq!(size, requested.min(cfg.api_max_page_size));
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn stock_never_goes_negative_under_movements(movements in movement_strategy()) {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("tokio runtime");

        runtime.block_on(async {
            let pool = common::test_pool().await;
            let product = ProductRepository::create(&pool, "P".into(), "P-1".into(), None).await.unwrap();
            let location = LocationRepository::create(&pool, "L".into(), "1 Long Road".into(), 10).await.unwrap();

            let mut expected: Option<i32> = None;
            for change in movements {
                let result = InventoryRepository::update_stock(&pool, product.id, location.id, change, None).await;
                let current = expected.unwrap_or(0);
                if current + change >= 0 {
                    let item = result.expect("movement within stock applies");
                    expected = Some(current + change);
                    assert_eq!(item.quantity, current + change);
                } else {
                    assert!(result.is_err());
                }

                let stored = InventoryRepository::get(&pool, product.id, location.id).await.unwrap();
                assert_eq!(stored.map(|item| item.quantity), expected);
            }
        });
    }
}
