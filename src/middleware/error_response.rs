//! Final shaping of error responses
//!
//! The router-wide timeout answers with a bare 408; it is replaced with the
//! structured `ApiError` body. Older web clients expect every business failure
//! as HTTP 200 with `{success: false, message}`, so when
//! `server.legacy_error_status` is set, responses produced by `ApiError` keep
//! their body but get status 200.

use crate::{
    app_state::AppState,
    error::{ApiError, ApiErrorMarker},
};
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};

pub async fn error_response_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    let is_api_error = response.extensions().get::<ApiErrorMarker>().is_some();

    if response.status() == StatusCode::REQUEST_TIMEOUT && !is_api_error {
        response = ApiError::RequestTimeout.into_response();
    }

    if state.config.server.legacy_error_status
        && response.extensions().get::<ApiErrorMarker>().is_some()
    {
        *response.status_mut() = StatusCode::OK;
    }

    response
}
