// HTTP request handlers
use crate::application::pipe_repository::DEFAULT_QR_SIZE;
use crate::application::qr_service::PREVIEW_QR_SIZE;
use crate::domain::dashboard::DashboardStats;
use crate::domain::pipe::{NewPipe, Pipe};
use crate::domain::risk_map::RiskMap;
use crate::domain::trend::{PointKind, TrendPoint};
use crate::infrastructure::chunked_json::stream_from_receiver;
use crate::infrastructure::geojson_mapper::risk_map_to_geojson;
use crate::infrastructure::http_response::{accepts_brotli, image_response, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::error::HandlerError;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;

#[derive(Deserialize)]
pub struct SizeQuery {
    pub size: Option<u32>,
}

#[derive(Deserialize)]
pub struct DownloadQuery {
    #[serde(default)]
    pub download: bool,
}

#[derive(Deserialize)]
pub struct OpenPreviewRequest {
    pub pipe_id: String,
    pub size: Option<u32>,
}

#[derive(Serialize)]
pub struct MapView {
    pub center: [f64; 2],
    pub zoom: u8,
    pub tile_url: String,
    pub attribution: String,
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Full dashboard snapshot
pub async fn get_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let dashboard = state.dashboard_service.snapshot().await;
    match json_response(&dashboard, StatusCode::OK, accepts_brotli(&headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Stream the dashboard widget by widget (progressive loading)
pub async fn stream_dashboard(headers: HeaderMap, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rx = state.streaming_service.stream_dashboard().await;
    stream_from_receiver(rx, accepts_brotli(&headers))
}

pub async fn list_pipes(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Pipe>>, HandlerError> {
    Ok(Json(state.dashboard_service.catalog().list_pipes().await?))
}

pub async fn get_pipe_by_qr(
    Path(code): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Result<Json<Pipe>, HandlerError> {
    Ok(Json(state.dashboard_service.catalog().pipe_by_qr(&code).await?))
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<DashboardStats>, HandlerError> {
    Ok(Json(state.dashboard_service.catalog().stats().await?))
}

pub async fn create_pipe(
    State(state): State<Arc<AppState>>,
    Json(new_pipe): Json<NewPipe>,
) -> Result<(StatusCode, Json<Pipe>), HandlerError> {
    let created = state.dashboard_service.catalog().create_pipe(&new_pipe).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Map view settings plus marker and heat layers.
/// A failed pipe fetch leaves only the base map.
pub async fn get_map(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let map = match state.dashboard_service.catalog().list_pipes().await {
        Ok(pipes) => RiskMap::project(&pipes),
        Err(e) => {
            tracing::warn!("Error fetching pipes for map: {}", e);
            RiskMap::default()
        }
    };

    let settings = &state.map_settings;
    let view = MapView {
        center: [settings.center_lat, settings.center_lon],
        zoom: settings.zoom,
        tile_url: settings.tile_url.clone(),
        attribution: settings.attribution.clone(),
    };

    Json(json!({
        "view": view,
        "layers": risk_map_to_geojson(&map),
    }))
}

pub async fn get_trend(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.dashboard_service.trend_chart() {
        Some(chart) => Json(chart).into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "error": "No trend history" }))).into_response(),
    }
}

/// Replace the historical defect series the projection starts from.
pub async fn put_trend_history(
    State(state): State<Arc<AppState>>,
    Json(history): Json<Vec<TrendPoint>>,
) -> impl IntoResponse {
    let history: Vec<TrendPoint> = history
        .into_iter()
        .map(|p| TrendPoint {
            kind: PointKind::Historical,
            ..p
        })
        .collect();
    tracing::info!("Replacing trend history with {} points", history.len());
    state.dashboard_service.trend().replace_history(history);
    StatusCode::NO_CONTENT
}

pub async fn get_qr_image(
    Path(code): Path<String>,
    Query(query): Query<SizeQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, HandlerError> {
    let size = query.size.unwrap_or(DEFAULT_QR_SIZE);
    let image = state.dashboard_service.catalog().qr_image_by_code(&code, size).await?;
    Ok(image_response(image, false))
}

pub async fn open_preview(
    Path(viewer): Path<String>,
    State(state): State<Arc<AppState>>,
    Json(request): Json<OpenPreviewRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let size = request.size.unwrap_or(PREVIEW_QR_SIZE);
    let url = state.qr_service.open(&viewer, &request.pipe_id, size).await?;
    Ok(Json(json!({ "url": url })))
}

pub async fn close_preview(Path(viewer): Path<String>, State(state): State<Arc<AppState>>) -> StatusCode {
    if state.qr_service.close(&viewer) {
        tracing::debug!("Preview for {} closed, {} images live", viewer, state.qr_service.live_images());
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

pub async fn get_preview_image(
    Path(handle): Path<u64>,
    Query(query): Query<DownloadQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    match state.qr_service.image(handle) {
        Some(image) => match image_response(image, query.download) {
            Ok(response) => response,
            Err(status) => status.into_response(),
        },
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
