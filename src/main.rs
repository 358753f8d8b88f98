// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::clock::{Clock, SystemClock};
use crate::application::dashboard_service::DashboardService;
use crate::application::pipe_catalog::PipeCatalog;
use crate::application::qr_service::QrPreviewService;
use crate::application::streaming_service::StreamingDashboardService;
use crate::application::trend_service::TrendService;
use crate::infrastructure::config::load_dashboard_config;
use crate::infrastructure::http_pipe_repository::HttpPipeRepository;
use crate::presentation::app_state::AppState;
use crate::presentation::router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_dashboard_config()?;
    let token = config.api.require_token()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(HttpPipeRepository::new(
        config.api.base_url.clone(),
        token,
        Duration::from_secs(config.api.timeout_secs),
    )?);

    // Create services (application layer)
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let catalog = PipeCatalog::new(repository);
    let trend = TrendService::new(config.trend.history, config.trend.seed, clock.clone());
    let dashboard_service = DashboardService::new(catalog.clone(), trend, clock, config.widgets.sparkline_seed);
    let streaming_service = StreamingDashboardService::new(dashboard_service.clone());
    let qr_service = QrPreviewService::with_limits(
        catalog,
        Duration::from_secs(config.previews.ttl_secs),
        config.previews.capacity,
    );

    // Create application state
    let state = Arc::new(AppState {
        dashboard_service,
        streaming_service,
        qr_service,
        map_settings: config.map,
    });

    // Responses are compressed by the handlers themselves, so no CompressionLayer here
    let router = router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting pipeline dashboard on {} (backend {})", addr, config.api.base_url);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
