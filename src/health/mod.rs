/*!
 * # Health Check Module
 *
 * Endpoints for monitoring the inventory service:
 *
 * - Basic health check (`/health`) - Simple up status with version
 * - Readiness check (`/health/ready`) - Pings the inventory table
 * - Liveness check (`/health/live`) - Process uptime
 * - Version (`/health/version`) - Build information
 */

use crate::store::InventoryTable;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tracing::{debug, error};

/// Basic health status
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Up,
    Down,
}

/// Health check state
#[derive(Clone)]
pub struct HealthState {
    pub table: Arc<dyn InventoryTable>,
    pub start_time: SystemTime,
}

impl HealthState {
    pub fn new(table: Arc<dyn InventoryTable>) -> Self {
        Self {
            table,
            start_time: SystemTime::now(),
        }
    }

    /// Calculate system uptime
    pub fn uptime(&self) -> u64 {
        SystemTime::now()
            .duration_since(self.start_time)
            .unwrap_or(Duration::from_secs(0))
            .as_secs()
    }

    /// Status of the inventory table
    pub async fn table_status(&self) -> (HealthStatus, Option<String>) {
        match self.table.ping().await {
            Ok(()) => (HealthStatus::Up, None),
            Err(e) => {
                error!(backend = self.table.backend_name(), error = %e, "Inventory table health check failed");
                (HealthStatus::Down, Some(e.to_string()))
            }
        }
    }
}

/// Returns build and version information
pub async fn version_info() -> impl IntoResponse {
    Json(json!({
        "version": env!("CARGO_PKG_VERSION"),
        "commit": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
    }))
}

/// Basic health check endpoint
pub async fn health_check() -> impl IntoResponse {
    debug!("Health check endpoint called");

    (
        StatusCode::OK,
        Json(json!({
            "status": HealthStatus::Up,
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Readiness check endpoint
pub async fn readiness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    debug!("Readiness check endpoint called");

    let (status, error) = state.table_status().await;
    let status_code = match status {
        HealthStatus::Up => StatusCode::OK,
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
    };

    (
        status_code,
        Json(json!({
            "ready": status == HealthStatus::Up,
            "store": {
                "backend": state.table.backend_name(),
                "status": status,
                "error": error,
            },
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Liveness check endpoint
pub async fn liveness_check(State(state): State<Arc<HealthState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(json!({
            "alive": true,
            "uptime_seconds": state.uptime(),
            "timestamp": Utc::now().to_rfc3339(),
        })),
    )
}

/// Creates router with health check endpoints, mounted at `/health`
pub fn health_routes(table: Arc<dyn InventoryTable>) -> Router {
    let health_state = Arc::new(HealthState::new(table));

    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/live", get(liveness_check))
        .route("/version", get(version_info))
        .with_state(health_state)
}
