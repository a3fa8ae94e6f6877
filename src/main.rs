// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use flock_telemetry::application::dashboard_service::DashboardService;
use flock_telemetry::application::hierarchy_service::HierarchyService;
use flock_telemetry::infrastructure::config::load_app_config;
use flock_telemetry::infrastructure::rest_repository::RestRepository;
use flock_telemetry::presentation::app_state::AppState;
use flock_telemetry::presentation::router::build_router;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let app_config = load_app_config()?;

    // Initialize tracing; RUST_LOG wins over the configured filter
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&app_config.log_filter));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let analysis = app_config.analysis.to_settings()?;

    // Create repository (infrastructure layer)
    let repository = Arc::new(
        RestRepository::new(&app_config.api).context("Failed to build upstream API client")?,
    );

    // Create services (application layer)
    let hierarchy_service = HierarchyService::new(repository.clone(), analysis.calendar);
    let dashboard_service = DashboardService::new(repository.clone(), analysis);

    // Create application state
    let state = Arc::new(AppState {
        hierarchy_service,
        dashboard_service,
        calendar: analysis.calendar,
        default_range_days: app_config.analysis.default_range_days,
        max_range_days: app_config.analysis.max_range_days,
    });

    // Build router (presentation layer)
    let router = build_router(state);

    // Start server
    let addr: SocketAddr = app_config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", app_config.server.bind))?;
    tracing::info!("Starting flock-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
