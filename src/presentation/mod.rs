// Presentation layer - HTTP surface of the dashboard
pub mod app_state;
pub mod error;
pub mod handlers;

use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    close_preview, create_pipe, get_dashboard, get_map, get_pipe_by_qr, get_preview_image, get_qr_image,
    get_stats, get_trend, health_check, list_pipes, open_preview, put_trend_history, stream_dashboard,
};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(health_check))
        .route("/dashboard", get(get_dashboard))
        .route("/dashboard/stream", get(stream_dashboard))
        .route("/pipes", get(list_pipes).post(create_pipe))
        .route("/pipes/qr/:code", get(get_pipe_by_qr))
        .route("/stats", get(get_stats))
        .route("/map", get(get_map))
        .route("/trend", get(get_trend))
        .route("/trend/history", put(put_trend_history))
        .route("/qr/:code/image", get(get_qr_image))
        .route("/admin/previews/:viewer", post(open_preview).delete(close_preview))
        .route("/admin/images/:handle", get(get_preview_image))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
