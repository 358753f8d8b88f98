// Chunked JSON streaming utilities
use crate::application::streaming_service::StreamMessage;
use crate::infrastructure::http_response::brotli;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio_stream::wrappers::ReceiverStream;

pub const CHUNK_CONTENT_TYPE: &str = "application/x-ndjson-framed";

/// Create a chunked streaming response of length-prefixed JSON messages
pub fn chunked_json_stream<S>(stream: S, compress: bool) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = StreamMessage> + Send + 'static,
{
    let byte_stream = stream.then(move |msg| async move { serialize_chunk(msg, compress).await });

    let body = Body::from_stream(byte_stream);

    // Chunks are compressed one by one, so there is no Content-Encoding header.
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, CHUNK_CONTENT_TYPE)
        .header("x-chunk-encoding", if compress { "br" } else { "identity" });

    response
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// Serialize a single StreamMessage to a chunk
pub async fn serialize_chunk(msg: StreamMessage, compress: bool) -> Result<Bytes, std::io::Error> {
    // 1. Serialize to JSON
    let buffer = serde_json::to_vec(&msg).map_err(std::io::Error::other)?;

    // 2. Optionally compress
    let payload = if compress { brotli(buffer).await? } else { buffer };

    // 3. Prepend length (4 bytes, big-endian)
    let length = payload.len() as u32;
    let mut chunk = BytesMut::with_capacity(4 + payload.len());
    chunk.put_u32(length);
    chunk.put_slice(&payload);

    Ok(chunk.freeze())
}

/// Splits a framed body back into its JSON payloads (uncompressed frames only).
#[cfg(test)]
pub fn split_frames(mut body: &[u8]) -> Option<Vec<serde_json::Value>> {
    let mut frames = Vec::new();
    while !body.is_empty() {
        if body.len() < 4 {
            return None;
        }
        let length = u32::from_be_bytes([body[0], body[1], body[2], body[3]]) as usize;
        let end = 4 + length;
        if body.len() < end {
            return None;
        }
        frames.push(serde_json::from_slice(&body[4..end]).ok()?);
        body = &body[end..];
    }
    Some(frames)
}

/// Helper to create a streaming response from a receiver
pub fn stream_from_receiver(
    rx: tokio::sync::mpsc::Receiver<StreamMessage>,
    compress: bool,
) -> impl IntoResponse {
    match chunked_json_stream(ReceiverStream::new(rx), compress) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::Widget;

    #[tokio::test]
    async fn test_chunk_is_length_prefixed() {
        let msg = StreamMessage::Complete {
            widgets: 9,
            duration_ms: 12,
        };
        let chunk = serialize_chunk(msg, false).await.unwrap();

        let frames = split_frames(&chunk).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0]["type"], "complete");
        assert_eq!(frames[0]["widgets"], 9);
    }

    #[tokio::test]
    async fn test_compressed_chunk_prefix_matches_payload() {
        let msg = StreamMessage::Skeleton {
            title: "Pipeline Monitoring".to_string(),
            widgets: Widget::ALL.to_vec(),
        };
        let chunk = serialize_chunk(msg, true).await.unwrap();
        let length = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]) as usize;
        assert_eq!(length + 4, chunk.len());
    }

    #[test]
    fn test_split_frames_rejects_truncated_input() {
        assert!(split_frames(&[0, 0, 0, 9, b'{']).is_none());
        assert_eq!(split_frames(&[]).unwrap().len(), 0);
    }
}
