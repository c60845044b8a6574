//! Upstream payment gateway (Razorpay orders API)

use crate::{
    config::PaymentConfig,
    error::{ApiError, Result},
    models::payment::{OrderInfo, OrderRequest, PaymentConfirmation},
};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, instrument};

type HmacSha256 = Hmac<Sha256>;

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open an order the client can pay against
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderInfo>;

    /// Check that a checkout callback really came from the gateway
    fn verify_payment(&self, confirmation: &PaymentConfirmation) -> bool;
}

pub struct RazorpayClient {
    key_id: String,
    key_secret: String,
    api_base: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct RazorpayOrderRequest<'a> {
    amount: i64,
    currency: &'a str,
    receipt: String,
}

#[derive(Debug, Deserialize)]
struct RazorpayOrder {
    id: String,
    amount: i64,
    currency: String,
    #[serde(default)]
    receipt: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl RazorpayClient {
    pub fn new(config: &PaymentConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ApiError::Internal(anyhow::anyhow!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            key_id: config.key_id.clone(),
            key_secret: config.key_secret.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            http_client,
        })
    }
}

#[async_trait]
impl PaymentGateway for RazorpayClient {
    #[instrument(skip(self, request), fields(amount = request.amount, receipt = %request.receipt))]
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderInfo> {
        let body = RazorpayOrderRequest {
            amount: request.amount,
            currency: &request.currency,
            receipt: request.receipt.to_string(),
        };

        let response = self
            .http_client
            .post(format!("{}/v1/orders", self.api_base))
            .basic_auth(&self.key_id, Some(&self.key_secret))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ApiError::UpstreamTimeout(format!("Order request timed out: {}", e))
                } else {
                    ApiError::Upstream(format!("Order request failed: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ApiError::Upstream(format!(
                "Payment gateway error ({}): {}",
                status, error_text
            )));
        }

        let order: RazorpayOrder = response
            .json()
            .await
            .map_err(|e| ApiError::Upstream(format!("Failed to parse order response: {}", e)))?;

        info!(
            order_id = %order.id,
            status = order.status.as_deref().unwrap_or("unknown"),
            "Payment order created"
        );

        Ok(OrderInfo {
            id: order.id,
            amount: order.amount,
            currency: order.currency,
            receipt: order
                .receipt
                .unwrap_or_else(|| request.receipt.to_string()),
        })
    }

    fn verify_payment(&self, confirmation: &PaymentConfirmation) -> bool {
        verify_signature(
            &self.key_secret,
            &confirmation.razorpay_order_id,
            &confirmation.razorpay_payment_id,
            &confirmation.razorpay_signature,
        )
    }
}

/// Checkout signature: hex(HMAC-SHA256(order_id + "|" + payment_id, key_secret)),
/// compared in constant time
pub fn verify_signature(secret: &str, order_id: &str, payment_id: &str, signature: &str) -> bool {
    let Ok(expected) = hex::decode(signature.trim()) else {
        return false;
    };

    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(order_id.as_bytes());
    mac.update(b"|");
    mac.update(payment_id.as_bytes());

    mac.verify_slice(&expected).is_ok()
}
