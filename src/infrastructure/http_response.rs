// HTTP response utilities for JSON+Brotli and image payloads
use crate::application::pipe_repository::QrImage;
use async_compression::tokio::bufread::BrotliEncoder;
use axum::{
    body::Body,
    http::{header, HeaderMap, HeaderValue, Response, StatusCode},
};
use serde::Serialize;
use tokio::io::AsyncReadExt;

/// Whether the client accepts Brotli.
pub fn accepts_brotli(headers: &HeaderMap) -> bool {
    headers
        .get(header::ACCEPT_ENCODING)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.contains("br"))
        .unwrap_or(false)
}

pub async fn brotli(bytes: Vec<u8>) -> std::io::Result<Vec<u8>> {
    let cursor = std::io::Cursor::new(bytes);
    let mut encoder = BrotliEncoder::new(cursor);
    let mut compressed = Vec::new();
    encoder.read_to_end(&mut compressed).await?;
    Ok(compressed)
}

/// Serialize to JSON, optionally compressed with Brotli
pub async fn json_response<T: Serialize>(
    data: &T,
    status: StatusCode,
    compress: bool,
) -> Result<Response<Body>, StatusCode> {
    let json_bytes = serde_json::to_vec(data).map_err(|e| {
        tracing::error!("JSON serialization error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let (body_bytes, content_encoding) = if compress {
        let original = json_bytes.len();
        let compressed = brotli(json_bytes).await.map_err(|e| {
            tracing::error!("Brotli compression error: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        tracing::debug!("Compressed: {} → {} bytes", original, compressed.len());
        (compressed, Some("br"))
    } else {
        (json_bytes, None)
    };

    let mut response_builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONTENT_LENGTH, body_bytes.len());

    if let Some(encoding) = content_encoding {
        response_builder = response_builder.header(header::CONTENT_ENCODING, encoding);
    }

    response_builder.body(Body::from(body_bytes)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

/// Serve a QR image; `download` adds an attachment filename.
pub fn image_response(image: QrImage, download: bool) -> Result<Response<Body>, StatusCode> {
    let content_type = HeaderValue::from_str(&image.content_type)
        .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

    let mut response_builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CONTENT_LENGTH, image.bytes.len())
        .header(header::CACHE_CONTROL, "no-store");

    if download {
        let disposition = format!("attachment; filename=\"qr_{}.png\"", sanitize_filename(&image.label));
        response_builder = response_builder.header(header::CONTENT_DISPOSITION, disposition);
    }

    response_builder.body(Body::from(image.bytes)).map_err(|e| {
        tracing::error!("Response build error: {}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })
}

fn sanitize_filename(label: &str) -> String {
    label
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}
