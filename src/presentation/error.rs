// Error responses for HTTP handlers
use crate::application::pipe_catalog::CreatePipeError;
use crate::application::pipe_repository::RepositoryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

pub const LOAD_FAILED: &str = "Failed to load data";

#[derive(Debug)]
pub enum HandlerError {
    Upstream(RepositoryError),
    Create(CreatePipeError),
    NotFound(String),
}

impl From<RepositoryError> for HandlerError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound(what) => HandlerError::NotFound(what),
            other => HandlerError::Upstream(other),
        }
    }
}

impl From<CreatePipeError> for HandlerError {
    fn from(e: CreatePipeError) -> Self {
        HandlerError::Create(e)
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            HandlerError::Upstream(e) => {
                tracing::error!("Upstream request failed: {}", e);
                (StatusCode::BAD_GATEWAY, LOAD_FAILED.to_string())
            }
            HandlerError::NotFound(what) => (StatusCode::NOT_FOUND, format!("Not found: {}", what)),
            HandlerError::Create(e) => {
                let status = match &e {
                    CreatePipeError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    CreatePipeError::Backend(RepositoryError::Rejected { status, .. })
                        if (400..500).contains(status) =>
                    {
                        StatusCode::BAD_REQUEST
                    }
                    CreatePipeError::Backend(_) => StatusCode::BAD_GATEWAY,
                };
                tracing::warn!("Create pipe failed: {}", e);
                (status, e.notification())
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}
