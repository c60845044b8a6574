use axum::{extract::State, Json};

use crate::{app_state::AppState, models::plans::PlansResponse};

/// GET /api/plans
pub async fn list_plans(State(state): State<AppState>) -> Json<PlansResponse> {
    let payments = &state.payment_service;

    Json(PlansResponse {
        success: true,
        currency: payments.currency().to_string(),
        plans: payments.plans().all().to_vec(),
    })
}
