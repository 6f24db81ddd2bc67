//! HTTP server implementation using Axum.

use axum::{
    Router,
    routing::{get, post},
};
use sheetwatch_core::config::GatewayConfig;
use sheetwatch_scheduler::PollingScheduler;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Shared state for the gateway server.
pub struct AppState {
    pub start_time: std::time::Instant,
    /// The polling service the control endpoints drive.
    pub scheduler: Arc<PollingScheduler>,
}

impl AppState {
    pub fn new(scheduler: Arc<PollingScheduler>) -> Self {
        Self {
            start_time: std::time::Instant::now(),
            scheduler,
        }
    }
}

/// Build the Axum router with all routes.
pub fn build_router(state: AppState) -> Router {
    build_router_from_arc(Arc::new(state))
}

pub fn build_router_from_arc(shared: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(super::routes::index))
        .route(
            "/start",
            get(super::routes::start_polling).post(super::routes::start_polling),
        )
        .route(
            "/stop",
            get(super::routes::stop_polling).post(super::routes::stop_polling),
        )
        .route("/status", get(super::routes::status))
        .route("/check_now", post(super::routes::check_now))
        .route("/history", get(super::routes::history))
        .route("/health", get(super::routes::health_check))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

/// Bind and serve until the process is stopped.
pub async fn start(config: &GatewayConfig, scheduler: Arc<PollingScheduler>) -> anyhow::Result<()> {
    let state = AppState::new(scheduler);
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Access the web interface at http://{}/", addr);
    tracing::info!("API Endpoints:");
    for (path, what) in [
        ("/start", "Begin monitoring"),
        ("/stop", "Stop monitoring"),
        ("/status", "Check monitoring status"),
        ("/check_now", "Manually trigger a check"),
        ("/history", "View check history"),
    ] {
        tracing::info!("  - http://{}{} - {}", addr, path, what);
    }

    axum::serve(listener, app).await?;
    Ok(())
}
