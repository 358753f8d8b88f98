// Repository trait for the pipe backend
use crate::domain::dashboard::DashboardStats;
use crate::domain::pipe::{NewPipe, Pipe};
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub const DEFAULT_QR_SIZE: u32 = 300;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend rejected credentials")]
    Unauthorized,
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend answered {status}")]
    Rejected { status: u16, detail: Option<String> },
    #[error("unexpected backend payload: {0}")]
    Decode(String),
}

impl RepositoryError {
    /// Message for the user: the backend's `detail` when it sent one.
    pub fn user_message(&self) -> String {
        match self {
            RepositoryError::Rejected {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// An encoded QR image as served by the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct QrImage {
    pub label: String,
    pub content_type: String,
    pub bytes: Bytes,
}

#[async_trait]
pub trait PipeRepository: Send + Sync {
    async fn list_pipes(&self) -> Result<Vec<Pipe>, RepositoryError>;

    async fn pipe_by_qr(&self, qr_code: &str) -> Result<Pipe, RepositoryError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, RepositoryError>;

    async fn create_pipe(&self, pipe: &NewPipe) -> Result<Pipe, RepositoryError>;

    /// QR image for a printed code.
    async fn qr_image_by_code(&self, qr_code: &str, size: u32) -> Result<QrImage, RepositoryError>;

    /// QR image for a pipe id; the label is the pipe id.
    async fn qr_image_by_pipe(&self, pipe_id: &str, size: u32) -> Result<QrImage, RepositoryError>;
}
