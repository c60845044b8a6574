// Route modules
pub mod auth;
pub mod image;
pub mod payment;
pub mod plans;

use crate::{
    app_state::AppState,
    middleware::{error_response_middleware, jwt_auth_middleware, logging_middleware},
};
use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    let request_timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Router::new()
        .route("/", get(health))
        .nest("/api", api_routes(state.clone()))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        // Outside the timeout so its bare 408 gets the structured body
        .layer(middleware::from_fn_with_state(
            state.clone(),
            error_response_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// GET /
async fn health() -> &'static str {
    "API Working"
}

/// API routes
fn api_routes(state: AppState) -> Router<AppState> {
    // Routes requiring a signed-in user
    let protected_routes = Router::new()
        .route("/user/credits", get(auth::user_credits))
        .route("/user/pay-razor", post(payment::create_order))
        .route("/user/verify-razor", post(payment::verify_payment))
        .route("/image/generate", post(image::generate_image))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_middleware,
        ));

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/user/register", post(auth::register))
        .route("/user/login", post(auth::login))
        .route("/plans", get(plans::list_plans));

    // Combine all routes with request/response body logging
    Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(middleware::from_fn(logging_middleware))
}
