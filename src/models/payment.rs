use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::plans::Plan;

/// POST /api/user/pay-razor request body
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    #[validate(length(max = 64))]
    pub plan_id: String,
}

/// Order details handed to the checkout widget
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderInfo {
    pub id: String,
    /// Minor currency units
    pub amount: i64,
    pub currency: String,
    pub receipt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub success: bool,
    pub order: OrderInfo,
}

/// Fields the checkout widget returns after a successful payment.
/// Names follow the gateway's callback payload verbatim.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PaymentConfirmation {
    #[validate(length(min = 1, max = 64))]
    pub razorpay_order_id: String,
    #[validate(length(min = 1, max = 64))]
    pub razorpay_payment_id: String,
    #[validate(length(min = 1, max = 128))]
    pub razorpay_signature: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyPaymentResponse {
    pub success: bool,
    pub message: String,
    pub credit_balance: i32,
}

/// Order request sent to the payment gateway
#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub amount: i64,
    pub currency: String,
    /// Our transaction id, echoed back by the gateway
    pub receipt: Uuid,
}

impl OrderRequest {
    pub fn for_plan(plan: &Plan, currency: &str, receipt: Uuid) -> Self {
        Self {
            amount: plan.price,
            currency: currency.to_string(),
            receipt,
        }
    }
}

/// Outcome of a confirmation as reported to the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfirmedPayment {
    pub credit_balance: i32,
    /// False when the order had been confirmed by an earlier callback
    pub newly_credited: bool,
}
