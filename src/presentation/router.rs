// Route table
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    activity, climate, flock_bounds, health_check, light, list_companies, list_devices,
    list_farms, list_flocks, quick_range,
};
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::trace::TraceLayer;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/companies", get(list_companies))
        .route("/companies/:id/farms", get(list_farms))
        .route("/farms/:id/flocks", get(list_flocks))
        .route("/farms/:id/devices", get(list_devices))
        .route("/flocks/:id/bounds", get(flock_bounds))
        .route("/flocks/:id/quick-range", get(quick_range))
        .route("/devices/:id/activity", get(activity))
        .route("/devices/:id/light", get(light))
        .route("/devices/:id/climate", get(climate))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
