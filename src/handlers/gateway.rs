/*!
 * # Gateway Contract
 *
 * Every inventory operation is a function from a [`GatewayRequest`] to a
 * [`GatewayResponse`]. The request carries optional path parameters, query
 * parameters and a body that is either already-parsed JSON or a raw JSON
 * string. The response always has a status code, the JSON content type and a
 * permissive CORS origin, and a JSON-encoded body with a `message`.
 */

use crate::errors::ServiceError;
use crate::models::{InventoryItem, ItemView, NewInventoryItem};
use crate::services::inventory::InventoryService;
use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, error, info};
use utoipa::ToSchema;

const CONTENT_TYPE_JSON: &str = "application/json";
const ALLOW_ANY_ORIGIN: &str = "*";

/// Request body as delivered by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RequestBody {
    /// JSON text that still has to be parsed.
    Raw(String),
    Json(Value),
}

impl RequestBody {
    /// Body bytes as read off the wire. Bytes that are not UTF-8 can never be a
    /// JSON object.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ServiceError> {
        std::str::from_utf8(bytes)
            .map(|text| Self::Raw(text.to_string()))
            .map_err(|e| ServiceError::validation_with_detail(BODY_NOT_OBJECT_MESSAGE, e.to_string()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayRequest {
    #[serde(default)]
    pub path_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
    #[serde(default)]
    pub body: Option<RequestBody>,
}

impl GatewayRequest {
    pub fn with_path_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.path_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_query_parameter(mut self, name: &str, value: impl Into<String>) -> Self {
        self.query_string_parameters
            .get_or_insert_with(HashMap::new)
            .insert(name.to_string(), value.into());
        self
    }

    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    /// Path parameter `name`, treating an empty value as absent.
    fn path_parameter(&self, name: &str) -> Option<&str> {
        non_empty(self.path_parameters.as_ref(), name)
    }

    fn query_parameter(&self, name: &str) -> Option<&str> {
        non_empty(self.query_string_parameters.as_ref(), name)
    }

    /// The body as a JSON object. An absent or blank body is an empty object,
    /// so every required field is then reported missing.
    fn payload(&self) -> Result<Map<String, Value>, ServiceError> {
        let value = match &self.body {
            None => return Ok(Map::new()),
            Some(RequestBody::Raw(text)) if text.trim().is_empty() => return Ok(Map::new()),
            Some(RequestBody::Raw(text)) => serde_json::from_str(text).map_err(|e| {
                ServiceError::validation_with_detail(BODY_NOT_OBJECT_MESSAGE, e.to_string())
            })?,
            Some(RequestBody::Json(value)) => value.clone(),
        };
        match value {
            Value::Object(map) => Ok(map),
            Value::Null => Ok(Map::new()),
            _ => Err(ServiceError::validation(BODY_NOT_OBJECT_MESSAGE)),
        }
    }
}

const BODY_NOT_OBJECT_MESSAGE: &str = "Request body must be a JSON object";

fn non_empty<'a>(parameters: Option<&'a HashMap<String, String>>, name: &str) -> Option<&'a str> {
    parameters
        .and_then(|params| params.get(name))
        .map(String::as_str)
        .filter(|value| !value.is_empty())
}

/// Response in the shape an API gateway proxies back to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl GatewayResponse {
    pub fn json<T: Serialize>(status: StatusCode, body: &T) -> Self {
        let headers = BTreeMap::from([
            ("Content-Type".to_string(), CONTENT_TYPE_JSON.to_string()),
            (
                "Access-Control-Allow-Origin".to_string(),
                ALLOW_ANY_ORIGIN.to_string(),
            ),
        ]);
        Self {
            status_code: status.as_u16(),
            headers,
            body: serde_json::to_string(body).unwrap_or_else(|e| {
                json!({ "message": "Error encoding response", "error": e.to_string() }).to_string()
            }),
        }
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Parses the body back into JSON.
    pub fn body_json(&self) -> serde_json::Result<Value> {
        serde_json::from_str(&self.body)
    }
}

impl From<ServiceError> for GatewayResponse {
    fn from(err: ServiceError) -> Self {
        match &err {
            ServiceError::InternalError { .. } => error!(error = %err, "Inventory request failed"),
            ServiceError::NotFound(_) => info!(error = %err, "Inventory record not found"),
            ServiceError::ValidationError { .. } => debug!(error = %err, "Rejected inventory request"),
        }
        Self::json(err.status_code(), &err.to_error_response())
    }
}

impl IntoResponse for GatewayResponse {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut response = (status, self.body).into_response();
        let headers = response.headers_mut();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                header::HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(name, value);
            }
        }
        response
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateItemResponse {
    pub message: String,
    pub item_id: String,
    pub item: ItemView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub message: String,
    pub item: ItemView,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LocationItemsResponse {
    pub message: String,
    pub location_id: i64,
    pub count: usize,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemListResponse {
    pub message: String,
    pub count: usize,
    pub items: Vec<ItemView>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

type Outcome<T> = Result<(StatusCode, T), ServiceError>;

fn respond<T: Serialize>(outcome: Outcome<T>) -> GatewayResponse {
    match outcome {
        Ok((status, body)) => GatewayResponse::json(status, &body),
        Err(err) => err.into(),
    }
}

fn required_location(raw: Option<&str>, missing: &str, invalid: &str) -> Result<i64, ServiceError> {
    let raw = raw.ok_or_else(|| ServiceError::validation(missing))?;
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ServiceError::validation(invalid))
}

fn item_views(items: &[InventoryItem]) -> Vec<ItemView> {
    items.iter().map(ItemView::from).collect()
}

/// Validates a create payload and writes a new record.
pub async fn create_item(service: &InventoryService, request: &GatewayRequest) -> GatewayResponse {
    respond(create(service, request).await)
}

async fn create(
    service: &InventoryService,
    request: &GatewayRequest,
) -> Outcome<CreateItemResponse> {
    let payload = request.payload()?;
    let new_item = NewInventoryItem::from_payload(&payload)?;
    let item = service.create_item(new_item).await?;
    Ok((
        StatusCode::CREATED,
        CreateItemResponse {
            message: "Successfully added inventory item".to_string(),
            item_id: item.id.clone(),
            item: ItemView::from(&item),
        },
    ))
}

/// Looks up a record by the `id` path parameter.
pub async fn get_item(service: &InventoryService, request: &GatewayRequest) -> GatewayResponse {
    respond(get(service, request).await)
}

async fn get(service: &InventoryService, request: &GatewayRequest) -> Outcome<ItemResponse> {
    let id = request
        .path_parameter("id")
        .ok_or_else(|| ServiceError::validation("Missing item ID in path parameters"))?;
    let item = service.get_item(id).await?;
    Ok((
        StatusCode::OK,
        ItemResponse {
            message: "Successfully retrieved inventory item".to_string(),
            item: ItemView::from(&item),
        },
    ))
}

/// Lists every record at the location named by the `id` path parameter.
pub async fn list_items_by_location(
    service: &InventoryService,
    request: &GatewayRequest,
) -> GatewayResponse {
    respond(list_by_location(service, request).await)
}

async fn list_by_location(
    service: &InventoryService,
    request: &GatewayRequest,
) -> Outcome<LocationItemsResponse> {
    let location_id = required_location(
        request.path_parameter("id"),
        "Missing location ID in path parameters",
        "Location ID must be a valid integer",
    )?;
    let items = service.list_items_by_location(location_id).await?;
    Ok((
        StatusCode::OK,
        LocationItemsResponse {
            message: format!(
                "Successfully retrieved inventory items for location {}",
                location_id
            ),
            location_id,
            count: items.len(),
            items: item_views(&items),
        },
    ))
}

/// Deletes the record at (`id` path parameter, `location_id` query parameter).
pub async fn delete_item(service: &InventoryService, request: &GatewayRequest) -> GatewayResponse {
    respond(delete(service, request).await)
}

async fn delete(service: &InventoryService, request: &GatewayRequest) -> Outcome<MessageResponse> {
    let id = request
        .path_parameter("id")
        .ok_or_else(|| ServiceError::validation("Missing item ID in path parameters"))?;
    let location_id = required_location(
        request.query_parameter("location_id"),
        "Missing location_id in query parameters",
        "location_id must be a valid integer",
    )?;
    service.delete_item(id, location_id).await?;
    Ok((
        StatusCode::OK,
        MessageResponse {
            message: format!("Successfully deleted inventory item with ID {}", id),
        },
    ))
}

/// Returns every record in the table. The request carries no parameters.
pub async fn list_all_items(service: &InventoryService, _request: &GatewayRequest) -> GatewayResponse {
    respond(list_all(service).await)
}

async fn list_all(service: &InventoryService) -> Outcome<ItemListResponse> {
    let items = service.list_all_items().await?;
    Ok((
        StatusCode::OK,
        ItemListResponse {
            message: "Successfully retrieved all inventory items".to_string(),
            count: items.len(),
            items: item_views(&items),
        },
    ))
}
