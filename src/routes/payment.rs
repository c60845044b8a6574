use axum::{extract::State, Json};
use tracing::instrument;
use validator::Validate;

use crate::{
    app_state::AppState,
    error::{ApiError, AppJson, Result},
    middleware::UserIdentity,
    models::payment::{
        CreateOrderRequest, CreateOrderResponse, PaymentConfirmation, VerifyPaymentResponse,
    },
};

/// POST /api/user/pay-razor
///
/// Request body: `{ "planId": "basic" }`
///
/// Response:
/// ```json
/// { "success": true, "order": { "id": "order_...", "amount": 1000, "currency": "INR", "receipt": "..." } }
/// ```
#[instrument(skip(state, request))]
pub async fn create_order(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<CreateOrderRequest>,
) -> Result<Json<CreateOrderResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let order = state
        .payment_service
        .create_order(identity.user_id, &request.plan_id)
        .await?;

    Ok(Json(CreateOrderResponse {
        success: true,
        order,
    }))
}

/// POST /api/user/verify-razor
///
/// Request body is the checkout callback payload:
/// ```json
/// { "razorpay_order_id": "order_...", "razorpay_payment_id": "pay_...", "razorpay_signature": "..." }
/// ```
#[instrument(skip(state, request))]
pub async fn verify_payment(
    State(state): State<AppState>,
    identity: UserIdentity,
    AppJson(request): AppJson<PaymentConfirmation>,
) -> Result<Json<VerifyPaymentResponse>> {
    request
        .validate()
        .map_err(|e| ApiError::BadRequest(format!("Validation error: {}", e)))?;

    let confirmed = state
        .payment_service
        .confirm_payment(identity.user_id, &request)
        .await?;

    let message = if confirmed.newly_credited {
        "Credits Added"
    } else {
        "Payment already processed"
    };

    Ok(Json(VerifyPaymentResponse {
        success: true,
        message: message.to_string(),
        credit_balance: confirmed.credit_balance,
    }))
}
