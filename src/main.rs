use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};

use inventory_api as api;
use api::config::{AppConfig, StoreBackend};
use api::store::{InMemoryTable, InventoryTable};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(&cfg.log_level, cfg.log_json);

    let table = build_table(&cfg).await?;
    info!(backend = table.backend_name(), "Inventory table ready");

    let inventory_service = api::services::inventory::InventoryService::new(table);
    let app = api::app_router(api::AppState::new(cfg.clone(), inventory_service));

    if cfg.cors_origins().is_none() {
        info!("Using permissive CORS because explicit origins were not configured");
    }

    // Bind and serve
    let addr = cfg.bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("inventory-api listening on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("inventory-api stopped");
    Ok(())
}

async fn build_table(cfg: &AppConfig) -> anyhow::Result<Arc<dyn InventoryTable>> {
    match cfg.store_backend() {
        StoreBackend::InMemory => {
            if !cfg.is_development() {
                warn!("In-memory inventory table in use outside development; records are lost on restart");
            }
            Ok(Arc::new(InMemoryTable::with_page_size(cfg.store_page_size)))
        }
        StoreBackend::DynamoDb => dynamodb_table(cfg).await,
    }
}

#[cfg(feature = "dynamodb")]
async fn dynamodb_table(cfg: &AppConfig) -> anyhow::Result<Arc<dyn InventoryTable>> {
    let table = api::store::dynamodb::DynamoDbTable::from_env(
        cfg.table_name.clone(),
        cfg.location_index_name.clone(),
    )
    .await;
    info!(
        table = %cfg.table_name,
        index = %cfg.location_index_name,
        "Using DynamoDB inventory table"
    );
    Ok(Arc::new(table))
}

#[cfg(not(feature = "dynamodb"))]
async fn dynamodb_table(_cfg: &AppConfig) -> anyhow::Result<Arc<dyn InventoryTable>> {
    anyhow::bail!("store_backend is \"dynamodb\" but this binary was built without the `dynamodb` feature")
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
