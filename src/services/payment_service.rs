use crate::{
    error::{ApiError, Result},
    models::{
        payment::{ConfirmedPayment, OrderInfo, OrderRequest, PaymentConfirmation},
        plans::PlanTable,
    },
    services::payment_gateway::PaymentGateway,
    store::{ConfirmOutcome, NewTransaction, TransactionStore, UserStore},
};
use std::{future::Future, sync::Arc, time::Duration};
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Credit purchases: order creation and confirmed-payment crediting
pub struct PaymentService {
    users: Arc<dyn UserStore>,
    transactions: Arc<dyn TransactionStore>,
    gateway: Arc<dyn PaymentGateway>,
    plans: PlanTable,
    currency: String,
    upstream_timeout: Duration,
}

impl PaymentService {
    pub fn new(
        users: Arc<dyn UserStore>,
        transactions: Arc<dyn TransactionStore>,
        gateway: Arc<dyn PaymentGateway>,
        plans: PlanTable,
        currency: impl Into<String>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            users,
            transactions,
            gateway,
            plans,
            currency: currency.into(),
            upstream_timeout,
        }
    }

    pub fn plans(&self) -> &PlanTable {
        &self.plans
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    /// Open a gateway order for `plan_id` and record it as pending.
    ///
    /// Nothing is persisted unless the gateway accepted the order, so an
    /// unknown plan or a gateway failure leaves no transaction behind.
    #[instrument(skip(self))]
    pub async fn create_order(&self, user_id: Uuid, plan_id: &str) -> Result<OrderInfo> {
        if plan_id.trim().is_empty() {
            return Err(ApiError::BadRequest("Missing Details".to_string()));
        }

        let plan = self
            .plans
            .get(plan_id)
            .ok_or_else(|| ApiError::InvalidPlan(format!("Unknown plan: {}", plan_id)))?
            .clone();

        if self.users.find_user(user_id).await?.is_none() {
            return Err(ApiError::NotFound("User not found".to_string()));
        }

        let transaction_id = Uuid::new_v4();
        let request = OrderRequest::for_plan(&plan, &self.currency, transaction_id);

        let order = self
            .with_timeout("order creation", self.gateway.create_order(&request))
            .await?;

        self.transactions
            .insert_pending(NewTransaction {
                id: transaction_id,
                user_id,
                order_id: order.id.clone(),
                plan: plan.id.clone(),
                amount: plan.price,
                currency: order.currency.clone(),
                credits: plan.credits,
            })
            .await?;

        info!(
            user_id = %user_id,
            order_id = %order.id,
            plan = %plan.id,
            credits = plan.credits,
            "Pending transaction recorded"
        );

        Ok(order)
    }

    /// Verify a checkout callback and credit the purchase exactly once.
    ///
    /// Replays of an already confirmed order succeed without crediting again.
    #[instrument(skip(self, confirmation), fields(order_id = %confirmation.razorpay_order_id))]
    pub async fn confirm_payment(
        &self,
        user_id: Uuid,
        confirmation: &PaymentConfirmation,
    ) -> Result<ConfirmedPayment> {
        if !self.gateway.verify_payment(confirmation) {
            warn!(user_id = %user_id, "Payment signature mismatch");
            return Err(ApiError::VerificationFailed(
                "Payment signature mismatch".to_string(),
            ));
        }

        let order_id = confirmation.razorpay_order_id.as_str();

        // Callers may only confirm their own orders
        let owned = self
            .transactions
            .find_by_order_id(order_id)
            .await?
            .is_some_and(|t| t.user_id == user_id);
        if !owned {
            return Err(ApiError::NotFound("Transaction not found".to_string()));
        }

        match self.transactions.confirm_if_pending(order_id).await? {
            ConfirmOutcome::Confirmed { credit_balance, .. } => Ok(ConfirmedPayment {
                credit_balance,
                newly_credited: true,
            }),
            ConfirmOutcome::AlreadyConfirmed { user_id } => {
                info!(order_id = order_id, "Replayed confirmation ignored");
                let user = self
                    .users
                    .find_user(user_id)
                    .await?
                    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;
                Ok(ConfirmedPayment {
                    credit_balance: user.credit_balance,
                    newly_credited: false,
                })
            }
            ConfirmOutcome::Missing => Err(ApiError::NotFound("Transaction not found".to_string())),
        }
    }

    async fn with_timeout<T>(
        &self,
        operation: &str,
        call: impl Future<Output = Result<T>>,
    ) -> Result<T> {
        tokio::time::timeout(self.upstream_timeout, call)
            .await
            .map_err(|_| {
                ApiError::UpstreamTimeout(format!(
                    "Payment gateway {} exceeded {}ms",
                    operation,
                    self.upstream_timeout.as_millis()
                ))
            })?
    }
}
