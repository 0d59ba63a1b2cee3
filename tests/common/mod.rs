#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use inventory_api::{
    config::AppConfig,
    models::{InventoryItem, ItemKey},
    services::inventory::InventoryService,
    store::{ContinuationToken, InMemoryTable, InventoryTable, KeyCondition, Page, StoreError},
    AppState,
};
use serde_json::{json, Value};
use tower::ServiceExt;

/// Page size small enough that every listing crosses several continuation tokens.
pub const TEST_PAGE_SIZE: usize = 2;

/// Helper harness driving the full application router in-process.
pub struct TestApp {
    router: Router,
    pub table: Arc<dyn InventoryTable>,
}

impl TestApp {
    /// Application backed by a fresh in-memory table.
    pub fn new() -> Self {
        Self::with_table(Arc::new(InMemoryTable::with_page_size(TEST_PAGE_SIZE)))
    }

    /// Application whose table fails every call.
    pub fn failing() -> Self {
        Self::with_table(Arc::new(FailingTable))
    }

    pub fn with_table(table: Arc<dyn InventoryTable>) -> Self {
        let config = AppConfig {
            environment: "test".to_string(),
            store_page_size: TEST_PAGE_SIZE,
            ..AppConfig::default()
        };
        let state = AppState::new(config, InventoryService::new(table.clone()));
        Self {
            router: inventory_api::app_router(state),
            table,
        }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<String>) -> Response {
        self.request_body(method, uri, body.map(String::into_bytes)).await
    }

    /// Sends arbitrary body bytes, which need not be UTF-8.
    pub async fn request_body(&self, method: Method, uri: &str, body: Option<Vec<u8>>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(Body::from).unwrap_or_else(Body::empty))
            .expect("request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router response")
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        into_parts(self.request(Method::GET, uri, None).await).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        into_parts(self.request(Method::DELETE, uri, None).await).await
    }

    pub async fn post_json(&self, uri: &str, payload: &Value) -> (StatusCode, Value) {
        self.post_raw(uri, payload.to_string()).await
    }

    pub async fn post_raw(&self, uri: &str, body: String) -> (StatusCode, Value) {
        into_parts(self.request(Method::POST, uri, Some(body)).await).await
    }

    /// Creates an item and returns its minted id.
    pub async fn create(&self, payload: &Value) -> String {
        let (status, body) = self.post_json("/api/v1/inventory", payload).await;
        assert_eq!(status, StatusCode::CREATED, "create failed: {}", body);
        body["item_id"].as_str().expect("item_id").to_string()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

async fn into_parts(response: Response) -> (StatusCode, Value) {
    let status = response.status();
    (status, response_json(response).await)
}

pub fn item_payload(name: &str, location_id: i64) -> Value {
    json!({
        "name": name,
        "description": format!("{} description", name),
        "qty": 10,
        "price": 19.99,
        "location_id": location_id
    })
}

/// Table double whose every call fails as an unreachable backend would.
pub struct FailingTable;

pub const FAILURE: &str = "connection refused";

#[async_trait]
impl InventoryTable for FailingTable {
    fn backend_name(&self) -> &'static str {
        "failing"
    }

    async fn get(&self, _key: &ItemKey) -> Result<Option<InventoryItem>, StoreError> {
        Err(StoreError::Backend(FAILURE.into()))
    }

    async fn put(&self, _item: InventoryItem) -> Result<(), StoreError> {
        Err(StoreError::Backend(FAILURE.into()))
    }

    async fn delete(&self, _key: &ItemKey) -> Result<(), StoreError> {
        Err(StoreError::Backend(FAILURE.into()))
    }

    async fn query(
        &self,
        _condition: &KeyCondition,
        _start: Option<ContinuationToken>,
    ) -> Result<Page, StoreError> {
        Err(StoreError::Backend(FAILURE.into()))
    }

    async fn scan(&self, _start: Option<ContinuationToken>) -> Result<Page, StoreError> {
        Err(StoreError::Backend(FAILURE.into()))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Err(StoreError::Unavailable(FAILURE.into()))
    }
}
