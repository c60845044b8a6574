use crate::error::ApiError;
use axum::{
    body::{to_bytes, Body, HttpBody},
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::Value;
use std::time::Instant;

/// Bodies larger than this are not buffered for logging
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
const MAX_LOGGED_CHARS: usize = 2000;

/// JSON fields never written to the log
const REDACTED_FIELDS: &[&str] = &["password", "token", "razorpay_signature", "email"];
/// JSON fields logged only by size (inline image payloads)
const SUMMARIZED_FIELDS: &[&str] = &["resultImage"];

/// Middleware that logs request and response bodies
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let request_id = uuid::Uuid::new_v4();
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let (parts, body) = request.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(request_id = %request_id, "Failed to read request body: {}", e);
            return (StatusCode::BAD_REQUEST, "Failed to read request body").into_response();
        }
    };

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        body = %loggable_body(&bytes),
        "→ Request"
    );

    // Reconstruct the request with the body
    let request = Request::from_parts(parts, Body::from(bytes));

    let response = next.run(request).await;

    let status = response.status();

    // Bodies that cannot be buffered safely pass through unlogged
    if !fits_log_buffer(response.body()) {
        tracing::info!(
            request_id = %request_id,
            method = %method,
            uri = %uri,
            status = %status.as_u16(),
            latency_ms = %start.elapsed().as_millis(),
            "← Response (body not logged)"
        );
        return response;
    }

    let (parts, body) = response.into_parts();

    let bytes = match to_bytes(body, MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return ApiError::Internal(anyhow::anyhow!("Failed to read response body: {}", e))
                .into_response();
        }
    };

    let latency = start.elapsed();

    tracing::info!(
        request_id = %request_id,
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        body = %loggable_body(&bytes),
        "← Response"
    );

    // Reconstruct the response with the body
    Response::from_parts(parts, Body::from(bytes))
}

fn fits_log_buffer(body: &Body) -> bool {
    body.size_hint()
        .upper()
        .is_some_and(|len| len <= MAX_BODY_BYTES as u64)
}

/// Render a body for the log: JSON with secrets redacted, otherwise lossy text,
/// truncated either way
fn loggable_body(bytes: &[u8]) -> String {
    let rendered = match serde_json::from_slice::<Value>(bytes) {
        Ok(mut json) => {
            scrub(&mut json);
            json.to_string()
        }
        Err(_) => String::from_utf8_lossy(bytes).into_owned(),
    };

    truncate_body(&rendered, MAX_LOGGED_CHARS)
}

fn scrub(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, field) in map.iter_mut() {
                if REDACTED_FIELDS.contains(&key.as_str()) {
                    *field = Value::String("[redacted]".to_string());
                } else if SUMMARIZED_FIELDS.contains(&key.as_str()) {
                    let len = field.as_str().map(str::len).unwrap_or(0);
                    *field = Value::String(format!("[{} bytes]", len));
                } else {
                    scrub(field);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(scrub),
        _ => {}
    }
}

/// Truncate body for logging, adding ellipsis if truncated
fn truncate_body(body: &str, max_chars: usize) -> String {
    let body = body.trim();
    match body.char_indices().nth(max_chars) {
        None => body.to_string(),
        Some((cut, _)) => format!(
            "{}...[truncated, {} bytes total]",
            &body[..cut],
            body.len()
        ),
    }
}
