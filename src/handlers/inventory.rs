use crate::errors::{ErrorResponse, ServiceError};
use crate::handlers::gateway::{
    self, CreateItemResponse, GatewayRequest, GatewayResponse, ItemListResponse, ItemResponse,
    LocationItemsResponse, MessageResponse, RequestBody,
};
use crate::services::inventory::InventoryService;
use axum::{
    body::Bytes,
    extract::{
        rejection::{BytesRejection, PathRejection},
        Path, RawQuery, State,
    },
    routing::get,
    Router,
};
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

/// Trait for inventory handler state that provides access to inventory service
pub trait InventoryHandlerState: Clone + Send + Sync + 'static {
    fn inventory_service(&self) -> &InventoryService;
}

/// Create payload accepted by `POST /api/v1/inventory`. Numeric fields may also
/// be sent as strings; any `id` is ignored.
#[derive(Debug, Deserialize, ToSchema)]
#[schema(example = json!({
    "name": "Widget",
    "description": "Blue widget",
    "qty": 12,
    "price": 19.99,
    "location_id": 42
}))]
pub struct CreateInventoryRequest {
    pub name: String,
    pub description: String,
    pub qty: u64,
    pub price: f64,
    pub location_id: i64,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteInventoryParams {
    /// Location half of the composite key
    pub location_id: i64,
}

/// Create the inventory router, mounted at `/inventory`
pub fn inventory_router<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new()
        .route("/", get(list_inventory::<S>).post(create_inventory::<S>))
        .route("/:id", get(get_inventory::<S>).delete(delete_inventory::<S>))
}

/// Create the location router, mounted at `/locations`
pub fn locations_router<S>() -> Router<S>
where
    S: InventoryHandlerState,
{
    Router::new().route("/:id/inventory", get(list_location_inventory::<S>))
}

/// Path extraction failures (e.g. an `id` that does not percent-decode to
/// UTF-8) leave the parameter absent so the gateway reports it as missing.
fn path_request(id: Result<Path<String>, PathRejection>) -> GatewayRequest {
    match id {
        Ok(Path(id)) => GatewayRequest::default().with_path_parameter("id", id),
        Err(rejection) => {
            debug!(error = %rejection.body_text(), "Unreadable path parameter");
            GatewayRequest::default()
        }
    }
}

fn query_parameters(query: Option<String>) -> Option<HashMap<String, String>> {
    let parameters: HashMap<String, String> = url::form_urlencoded::parse(query?.as_bytes())
        .into_owned()
        .collect();
    (!parameters.is_empty()).then_some(parameters)
}

/// Add an inventory item
#[utoipa::path(
    post,
    path = "/api/v1/inventory",
    request_body = CreateInventoryRequest,
    responses(
        (status = 201, description = "Inventory item created", body = CreateItemResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Missing or invalid fields", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn create_inventory<S>(
    State(state): State<S>,
    body: Result<Bytes, BytesRejection>,
) -> GatewayResponse
where
    S: InventoryHandlerState,
{
    let body = body
        .map_err(|rejection| {
            ServiceError::validation_with_detail("Request body could not be read", rejection.body_text())
        })
        .and_then(|bytes| RequestBody::from_bytes(&bytes));
    match body {
        Ok(body) => {
            let request = GatewayRequest::default().with_body(body);
            gateway::create_item(state.inventory_service(), &request).await
        }
        Err(err) => err.into(),
    }
}

/// List every inventory item
#[utoipa::path(
    get,
    path = "/api/v1/inventory",
    responses(
        (status = 200, description = "All inventory items", body = ItemListResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_inventory<S>(State(state): State<S>) -> GatewayResponse
where
    S: InventoryHandlerState,
{
    gateway::list_all_items(state.inventory_service(), &GatewayRequest::default()).await
}

/// Get an inventory item by ID
#[utoipa::path(
    get,
    path = "/api/v1/inventory/{id}",
    params(
        ("id" = String, Path, description = "Inventory item ID")
    ),
    responses(
        (status = 200, description = "Inventory item returned", body = ItemResponse,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn get_inventory<S>(
    State(state): State<S>,
    id: Result<Path<String>, PathRejection>,
) -> GatewayResponse
where
    S: InventoryHandlerState,
{
    gateway::get_item(state.inventory_service(), &path_request(id)).await
}

/// Delete an inventory item at one location
#[utoipa::path(
    delete,
    path = "/api/v1/inventory/{id}",
    params(
        ("id" = String, Path, description = "Inventory item ID"),
        DeleteInventoryParams
    ),
    responses(
        (status = 200, description = "Inventory item deleted", body = MessageResponse),
        (status = 400, description = "Missing or invalid location_id", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn delete_inventory<S>(
    State(state): State<S>,
    id: Result<Path<String>, PathRejection>,
    RawQuery(query): RawQuery,
) -> GatewayResponse
where
    S: InventoryHandlerState,
{
    let mut request = path_request(id);
    request.query_string_parameters = query_parameters(query);
    gateway::delete_item(state.inventory_service(), &request).await
}

/// List inventory items at a location
#[utoipa::path(
    get,
    path = "/api/v1/locations/{id}/inventory",
    params(
        ("id" = i64, Path, description = "Location ID")
    ),
    responses(
        (status = 200, description = "Inventory items at the location", body = LocationItemsResponse),
        (status = 400, description = "Invalid location ID", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "inventory"
)]
pub async fn list_location_inventory<S>(
    State(state): State<S>,
    id: Result<Path<String>, PathRejection>,
) -> GatewayResponse
where
    S: InventoryHandlerState,
{
    gateway::list_items_by_location(state.inventory_service(), &path_request(id)).await
}
