//! Inventory API Library
//!
//! CRUD operations over a single inventory table keyed by (`id`, `location_id`),
//! exposed over HTTP with axum.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod models;
pub mod openapi;
pub mod services;
pub mod store;
pub mod tracing;

use axum::{extract::State, http::HeaderValue, response::Json, routing::get, Router};
use chrono::Utc;
use serde_json::{json, Value};
use tower_http::cors::{Any, CorsLayer};

use handlers::inventory::{inventory_router, locations_router};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: config::AppConfig,
    pub inventory_service: services::inventory::InventoryService,
}

impl AppState {
    pub fn new(
        config: config::AppConfig,
        inventory_service: services::inventory::InventoryService,
    ) -> Self {
        Self {
            config,
            inventory_service,
        }
    }
}

/// Routes served under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .nest("/inventory", inventory_router::<AppState>())
        .nest("/locations", locations_router::<AppState>())
}

/// CORS layer from config: the listed origins, or any origin when none are set.
pub fn cors_layer(config: &config::AppConfig) -> CorsLayer {
    let origins: Option<Vec<HeaderValue>> = config
        .cors_origins()
        .map(|origins| {
            origins
                .iter()
                .filter_map(|origin| HeaderValue::from_str(origin).ok())
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    match origins {
        Some(origins) => CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    }
}

/// The full application: health checks, the v1 API and Swagger UI, wrapped in
/// tracing, CORS and request-id layers.
pub fn app_router(state: AppState) -> Router {
    let table = state.inventory_service.table().clone();
    let cors = cors_layer(&state.config);

    Router::<AppState>::new()
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
        .nest("/health", health::health_routes(table))
        // HTTP tracing layer for consistent request/response telemetry
        .layer(tracing::configure_http_tracing())
        .layer(cors)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

async fn api_status(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "environment": state.config.environment,
        "store_backend": state.inventory_service.table().backend_name(),
        "request_id": crate::tracing::current_request_id().map(|rid| rid.to_string()),
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
