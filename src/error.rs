use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("No Credit Balance")]
    InsufficientCredit { balance: i32 },

    #[error("Invalid plan: {0}")]
    InvalidPlan(String),

    #[error("Payment verification failed: {0}")]
    VerificationFailed(String),

    #[error("Upstream error: {0}")]
    Upstream(String),

    #[error("Upstream timed out: {0}")]
    UpstreamTimeout(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Request timed out")]
    RequestTimeout,

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

/// Marks a response as produced by `ApiError`, so later layers can tell
/// business failures apart from ordinary responses
#[derive(Debug, Clone, Copy)]
pub struct ApiErrorMarker;

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::BadRequest(_) | ApiError::InvalidPlan(_) | ApiError::VerificationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::InsufficientCredit { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Unauthorized(_) | ApiError::InvalidToken(_) | ApiError::ExpiredToken => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "PERSISTENCE_ERROR",
            ApiError::BadRequest(_) => "INVALID_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::InsufficientCredit { .. } => "INSUFFICIENT_CREDIT",
            ApiError::InvalidPlan(_) => "INVALID_PLAN",
            ApiError::VerificationFailed(_) => "VERIFICATION_FAILED",
            ApiError::Upstream(_) => "UPSTREAM_ERROR",
            ApiError::UpstreamTimeout(_) => "UPSTREAM_TIMEOUT",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::InvalidToken(_) => "INVALID_TOKEN",
            ApiError::ExpiredToken => "TOKEN_EXPIRED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::RequestTimeout => "REQUEST_TIMEOUT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        let message = match self {
            ApiError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "An internal database error occurred".to_string()
            }
            ApiError::Upstream(ref msg) => {
                tracing::error!("Upstream error: {}", msg);
                "Upstream service temporarily unavailable".to_string()
            }
            ApiError::UpstreamTimeout(ref msg) => {
                tracing::error!("Upstream timeout: {}", msg);
                "Upstream service timed out".to_string()
            }
            ApiError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            ApiError::InsufficientCredit { .. } => "No Credit Balance".to_string(),
            ApiError::ExpiredToken => "Token expired".to_string(),
            ApiError::RequestTimeout => {
                tracing::warn!("Request exceeded the server timeout");
                "Request timed out".to_string()
            }
            ApiError::BadRequest(ref msg)
            | ApiError::NotFound(ref msg)
            | ApiError::InvalidPlan(ref msg)
            | ApiError::VerificationFailed(ref msg)
            | ApiError::Unauthorized(ref msg)
            | ApiError::InvalidToken(ref msg)
            | ApiError::Conflict(ref msg) => msg.clone(),
        };

        let mut body = json!({
            "success": false,
            "code": code,
            "message": message,
        });
        if let ApiError::InsufficientCredit { balance } = self {
            body["creditBalance"] = json!(balance);
        }

        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(ApiErrorMarker);
        response
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Missing Details: {}", rejection.body_text()))
    }
}

/// JSON extractor whose rejections use the structured error body
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

// Helper type for results
pub type Result<T> = std::result::Result<T, ApiError>;
