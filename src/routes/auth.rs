use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    middleware::UserIdentity,
    models::auth::{
        AuthResponse, CreditsResponse, LoginRequest, RegisterRequest, UserName, UserResponse,
    },
};

/// POST /api/user/register
///
/// Request body:
/// ```json
/// { "name": "Ada", "email": "ada@example.com", "password": "..." }
/// ```
///
/// Response:
/// ```json
/// {
///   "success": true,
///   "token": "eyJ...",
///   "user": { "id": "...", "name": "Ada", "email": "ada@example.com", "creditBalance": 5, "createdAt": "..." }
/// }
/// ```
#[instrument(skip(state, request))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<Json<AuthResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let tokens = state
        .auth_service
        .register(&request.name, &request.email, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        success: true,
        token: tokens.token,
        user: UserResponse::from(tokens.user),
    }))
}

/// POST /api/user/login
#[instrument(skip(state, request))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let tokens = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(AuthResponse {
        success: true,
        token: tokens.token,
        user: UserResponse::from(tokens.user),
    }))
}

/// GET /api/user/credits
///
/// Response:
/// ```json
/// { "success": true, "credits": 4, "user": { "name": "Ada" } }
/// ```
#[instrument(skip(state))]
pub async fn user_credits(
    State(state): State<AppState>,
    identity: UserIdentity,
) -> Result<Json<CreditsResponse>> {
    let user = state.auth_service.get_user(identity.user_id).await?;

    Ok(Json(CreditsResponse {
        success: true,
        credits: user.credit_balance,
        user: UserName { name: user.name },
    }))
}
