//! Property-based tests for the inventory API.
//!
//! These tests use proptest to check create-payload validation and the
//! decimal price boundary across a wide range of inputs.

use std::sync::Arc;

use inventory_api::errors::ServiceError;
use inventory_api::handlers::gateway::{self, GatewayRequest, RequestBody};
use inventory_api::models::inventory_item::REQUIRED_FIELDS;
use inventory_api::models::NewInventoryItem;
use inventory_api::services::inventory::InventoryService;
use inventory_api::store::InMemoryTable;
use proptest::prelude::*;
use serde_json::{json, Map, Value};

// Strategies for generating test data
fn price_strategy() -> impl Strategy<Value = String> {
    (0u64..1_000_000, 0u8..100).prop_map(|(dollars, cents)| format!("{}.{:02}", dollars, cents))
}

fn quantity_strategy() -> impl Strategy<Value = u64> {
    0u64..1_000_000
}

fn full_payload(price: Value, qty: u64, location_id: i64) -> Map<String, Value> {
    json!({
        "name": "Widget",
        "description": "Generated widget",
        "qty": qty,
        "price": price,
        "location_id": location_id
    })
    .as_object()
    .cloned()
    .unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

// Property: exactly the removed fields are reported missing
proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn missing_fields_match_removed_subset(mask in 1u8..32) {
        let mut payload = full_payload(json!(1.5), 1, 1);
        let removed: Vec<String> = REQUIRED_FIELDS
            .iter()
            .enumerate()
            .filter(|(bit, _)| mask & (1 << bit) != 0)
            .map(|(_, field)| field.to_string())
            .collect();
        for field in &removed {
            payload.remove(field);
        }

        match NewInventoryItem::from_payload(&payload) {
            Err(ServiceError::ValidationError { missing_fields, .. }) => {
                prop_assert_eq!(missing_fields, removed);
            }
            other => prop_assert!(false, "expected missing fields, got {:?}", other),
        }
    }

    #[test]
    fn non_negative_quantities_and_prices_are_accepted(
        qty in quantity_strategy(),
        price in price_strategy(),
        location_id in any::<i64>(),
    ) {
        let payload = full_payload(json!(price), qty, location_id);
        let item = NewInventoryItem::from_payload(&payload);
        prop_assert!(item.is_ok(), "rejected qty={} price={}", qty, price);
        let item = item.unwrap();
        prop_assert_eq!(item.qty, qty);
        prop_assert_eq!(item.location_id, location_id);
    }

    #[test]
    fn negative_quantities_are_rejected(qty in i64::MIN..0) {
        let mut payload = full_payload(json!(1), 0, 1);
        payload.insert("qty".into(), json!(qty));
        let is_client_error = matches!(
            NewInventoryItem::from_payload(&payload),
            Err(ServiceError::ValidationError { .. })
        );
        prop_assert!(is_client_error);
    }
}

// Property: a submitted price reads back as the same JSON number
proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn price_round_trips_through_create_and_read(price in price_strategy()) {
        let submitted: Value = serde_json::from_str(&price).unwrap();
        let (created, fetched) = runtime().block_on(async {
            let service = InventoryService::new(Arc::new(InMemoryTable::with_page_size(1)));
            let body = json!({
                "name": "Widget",
                "description": "Generated widget",
                "qty": 1,
                "price": submitted.clone(),
                "location_id": 1
            });
            let request = GatewayRequest::default().with_body(RequestBody::Json(body));
            let created = gateway::create_item(&service, &request).await.body_json().unwrap();

            let id = created["item_id"].as_str().unwrap().to_string();
            let request = GatewayRequest::default().with_path_parameter("id", id);
            let fetched = gateway::get_item(&service, &request).await.body_json().unwrap();
            (created, fetched)
        });

        prop_assert_eq!(&created["item"]["price"], &submitted);
        prop_assert_eq!(&fetched["item"]["price"], &submitted);
    }
}
