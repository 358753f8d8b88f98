// REST repository for the pipe backend
use crate::application::pipe_repository::{PipeRepository, QrImage, RepositoryError};
use crate::domain::dashboard::DashboardStats;
use crate::domain::pipe::{NewPipe, Pipe};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HttpPipeRepository {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

/// Error body shape used by the backend.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<serde_json::Value>,
}

impl HttpPipeRepository {
    pub fn new(base_url: String, token: String, timeout: Duration) -> Result<Self, RepositoryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(AUTHORIZATION, format!("Bearer {}", self.token))
    }

    fn json_request(&self, request: RequestBuilder) -> RequestBuilder {
        self.authorized(request)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response, RepositoryError> {
        let response = request.send().await.map_err(|e| {
            tracing::error!("Request for {} failed: {}", what, e);
            RepositoryError::Transport(e.to_string())
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!("Backend answered {} for {}: {}", status, what, body);
        Err(Self::status_error(status, what, &body))
    }

    fn status_error(status: StatusCode, what: &str, body: &str) -> RepositoryError {
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RepositoryError::Unauthorized,
            StatusCode::NOT_FOUND => RepositoryError::NotFound(what.to_string()),
            _ => RepositoryError::Rejected {
                status: status.as_u16(),
                detail: extract_detail(body),
            },
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, RepositoryError> {
        let request = self.json_request(self.client.get(self.url(path)));
        let response = self.send(request, path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn get_image(&self, path: &str, label: &str) -> Result<QrImage, RepositoryError> {
        // No JSON content type on image requests.
        let request = self.authorized(self.client.get(self.url(path)));
        let response = self.send(request, path).await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("image/png")
            .to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| RepositoryError::Transport(e.to_string()))?;

        tracing::debug!("Fetched QR image for {} ({} bytes)", label, bytes.len());
        Ok(QrImage {
            label: label.to_string(),
            content_type,
            bytes,
        })
    }
}

/// `detail` from a JSON error body; validation errors carry a list of messages.
fn extract_detail(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(detail) => Some(detail),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()).map(str::to_string))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        other => Some(other.to_string()),
    }
}

#[async_trait]
impl PipeRepository for HttpPipeRepository {
    async fn list_pipes(&self) -> Result<Vec<Pipe>, RepositoryError> {
        self.get_json("/pipes").await
    }

    async fn pipe_by_qr(&self, qr_code: &str) -> Result<Pipe, RepositoryError> {
        self.get_json(&format!("/pipes/qr/{}", urlencoding::encode(qr_code)))
            .await
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError> {
        self.get_json("/pipes/stats").await
    }

    async fn create_pipe(&self, pipe: &NewPipe) -> Result<Pipe, RepositoryError> {
        let request = self.json_request(self.client.post(self.url("/pipes"))).json(pipe);
        let response = self.send(request, "/pipes").await?;
        response
            .json::<Pipe>()
            .await
            .map_err(|e| RepositoryError::Decode(e.to_string()))
    }

    async fn qr_image_by_code(&self, qr_code: &str, size: u32) -> Result<QrImage, RepositoryError> {
        let path = format!("/pipes/qr-code/{}/image?size={}", urlencoding::encode(qr_code), size);
        self.get_image(&path, qr_code).await
    }

    async fn qr_image_by_pipe(&self, pipe_id: &str, size: u32) -> Result<QrImage, RepositoryError> {
        let path = format!("/pipes/{}/qr-code?size={}", urlencoding::encode(pipe_id), size);
        self.get_image(&path, pipe_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipe_repository::DEFAULT_QR_SIZE;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode as AxumStatus};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;
    use std::collections::HashMap;

    const TOKEN: &str = "test-token";

    fn authorized(headers: &HeaderMap) -> bool {
        headers.get("authorization").and_then(|v| v.to_str().ok()) == Some("Bearer test-token")
    }

    async fn list(headers: HeaderMap) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, Json(json!({"detail": "Invalid API key"}))).into_response();
        }
        Json(json!([
            {"id": "p1", "qr_code": "PL-A-1", "current_status": "active", "risk_score": 0.7,
             "location": {"lat": 51.1, "lon": 71.4}},
            {"id": "p2", "qr_code": "PL-A-2", "current_status": "maintenance"},
            {"id": "p3", "qr_code": "PL-A-3", "current_status": "active", "location": {"lat": 51.2, "lon": null}}
        ]))
        .into_response()
    }

    async fn stats() -> impl IntoResponse {
        Json(json!({"total_length": 120.5, "total_inspections": 40, "critical_defects": 3, "active_pipes": 25}))
    }

    async fn by_qr(Path(code): Path<String>) -> impl IntoResponse {
        if code == "PL A/1" {
            Json(json!({"id": "p1", "qr_code": code, "current_status": "active"})).into_response()
        } else {
            (AxumStatus::NOT_FOUND, Json(json!({"detail": "Pipe not found"}))).into_response()
        }
    }

    async fn create(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
        if body["company"] == "DUPLICATE" {
            return (
                AxumStatus::BAD_REQUEST,
                Json(json!({"detail": "Pipe with QR code 'PL-DUPLICATE' already exists"})),
            )
                .into_response();
        }
        let mut pipe = body.clone();
        pipe["id"] = json!("p9");
        pipe["qr_code"] = json!("PL-ACME-9");
        pipe["current_status"] = json!("active");
        (AxumStatus::CREATED, Json(pipe)).into_response()
    }

    async fn image(
        Path(id): Path<String>,
        Query(query): Query<HashMap<String, String>>,
        headers: HeaderMap,
    ) -> impl IntoResponse {
        if !authorized(&headers) {
            return (AxumStatus::UNAUTHORIZED, Json(json!({"detail": "Invalid API key"}))).into_response();
        }
        assert!(headers.get("content-type").is_none());
        let size = query.get("size").cloned().unwrap_or_default();
        ([("content-type", "image/png")], format!("png:{}:{}", id, size)).into_response()
    }

    async fn spawn_backend() -> String {
        let app = Router::new()
            .route("/api/v1/pipes", get(list).post(create))
            .route("/api/v1/pipes/stats", get(stats))
            .route("/api/v1/pipes/qr/:code", get(by_qr))
            .route("/api/v1/pipes/:id/qr-code", get(image))
            .route("/api/v1/pipes/qr-code/:code/image", get(image));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}/api/v1/", addr)
    }

    async fn repository(token: &str) -> HttpPipeRepository {
        let base = spawn_backend().await;
        HttpPipeRepository::new(base, token.to_string(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_list_pipes_sends_bearer_token() {
        let repo = repository(TOKEN).await;
        let pipes = repo.list_pipes().await.unwrap();
        assert_eq!(pipes.len(), 3);
        assert_eq!(pipes[0].risk_score, Some(0.7));
        assert!(pipes[1].location.is_none());
        assert!(pipes[2].plottable_location().is_none());
    }

    #[tokio::test]
    async fn test_wrong_token_is_unauthorized() {
        let repo = repository("wrong").await;
        assert!(matches!(repo.list_pipes().await, Err(RepositoryError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_stats_verbatim() {
        let repo = repository(TOKEN).await;
        let stats = repo.dashboard_stats().await.unwrap();
        assert_eq!(stats.total_length, 120.5);
        assert_eq!(stats.active_pipes, 25);
    }

    #[tokio::test]
    async fn test_pipe_by_qr_encodes_path() {
        let repo = repository(TOKEN).await;
        assert_eq!(repo.pipe_by_qr("PL A/1").await.unwrap().id, "p1");
        assert!(matches!(repo.pipe_by_qr("other").await, Err(RepositoryError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_create_pipe() {
        let repo = repository(TOKEN).await;
        let mut new_pipe = NewPipe::new("ACME");
        new_pipe.material = Some("Steel".to_string());
        new_pipe.diameter_mm = Some(100);

        let pipe = repo.create_pipe(&new_pipe).await.unwrap();
        assert_eq!(pipe.id, "p9");
        assert_eq!(pipe.material.as_deref(), Some("Steel"));
        assert_eq!(pipe.diameter_mm, Some(100));
    }

    #[tokio::test]
    async fn test_create_rejection_carries_detail() {
        let repo = repository(TOKEN).await;
        let err = repo.create_pipe(&NewPipe::new("DUPLICATE")).await.unwrap_err();
        assert_eq!(err.user_message(), "Pipe with QR code 'PL-DUPLICATE' already exists");
    }

    #[tokio::test]
    async fn test_qr_image_by_pipe() {
        let repo = repository(TOKEN).await;
        let image = repo.qr_image_by_pipe("p1", 400).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, bytes::Bytes::from("png:p1:400"));
        assert_eq!(image.label, "p1");
    }

    #[tokio::test]
    async fn test_qr_image_by_code() {
        let repo = repository(TOKEN).await;
        let image = repo.qr_image_by_code("PL A/1", DEFAULT_QR_SIZE).await.unwrap();
        assert_eq!(image.content_type, "image/png");
        assert_eq!(image.bytes, bytes::Bytes::from("png:PL A/1:300"));
        assert_eq!(image.label, "PL A/1");
    }

    #[tokio::test]
    async fn test_image_requests_carry_token() {
        let repo = repository("wrong").await;
        assert!(matches!(
            repo.qr_image_by_code("PL-A-1", DEFAULT_QR_SIZE).await,
            Err(RepositoryError::Unauthorized)
        ));
        assert!(matches!(
            repo.qr_image_by_pipe("p1", 400).await,
            Err(RepositoryError::Unauthorized)
        ));
    }

    #[test]
    fn test_extract_detail() {
        assert_eq!(extract_detail(r#"{"detail": "boom"}"#).as_deref(), Some("boom"));
        assert_eq!(
            extract_detail(r#"{"detail": [{"msg": "field required"}, {"msg": "too short"}]}"#).as_deref(),
            Some("field required; too short")
        );
        assert_eq!(extract_detail("Internal Server Error"), None);
        assert_eq!(extract_detail("{}"), None);
    }
}
