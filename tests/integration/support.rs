//! Shared fixtures: a complete config, fake upstreams and an app over the in-memory store

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use imagify::{
    config::{
        AuthConfig, Config, DatabaseConfig, ImageConfig, LoggingConfig, PaymentConfig,
        PlanConfig, ServerConfig,
    },
    models::{
        image::GeneratedImage,
        payment::{OrderInfo, OrderRequest, PaymentConfirmation},
    },
    services::{payment_gateway::verify_signature, ImageGenerator, PaymentGateway},
    store::{MemoryStore, NewUser, UserStore},
    ApiError, AppState, Backends, Result,
};
use sha2::Sha256;
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};
use uuid::Uuid;

pub const KEY_SECRET: &str = "rzp_test_integration_secret";

/// PNG magic bytes; enough for the data URL
pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

pub fn test_config() -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 4000,
            request_timeout_secs: 30,
            legacy_error_status: false,
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
            run_migrations: false,
        },
        logging: LoggingConfig::default(),
        image: ImageConfig {
            api_key: "test-image-key".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            request_timeout_ms: 1_000,
        },
        payment: PaymentConfig {
            key_id: "rzp_test_key".to_string(),
            key_secret: KEY_SECRET.to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
            currency: "INR".to_string(),
            request_timeout_ms: 1_000,
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-with-enough-entropy".to_string(),
            token_expiration_minutes: 60,
            starting_credits: 5,
        },
        plans: vec![
            plan("basic", 1000, 100),
            plan("advanced", 5000, 500),
            plan("business", 25000, 5000),
        ],
    }
}

fn plan(id: &str, price: i64, credits: i32) -> PlanConfig {
    PlanConfig {
        id: id.to_string(),
        description: format!("{} plan", id),
        price,
        credits,
    }
}

/// Checkout signature as the gateway would compute it
pub fn sign(order_id: &str, payment_id: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(KEY_SECRET.as_bytes()).unwrap();
    mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn confirmation(order_id: &str) -> PaymentConfirmation {
    let payment_id = format!("pay_{}", order_id.trim_start_matches("order_"));
    PaymentConfirmation {
        razorpay_signature: sign(order_id, &payment_id),
        razorpay_order_id: order_id.to_string(),
        razorpay_payment_id: payment_id,
    }
}

#[derive(Debug, Clone, Copy)]
pub enum GeneratorBehavior {
    Succeed,
    Fail,
    Hang,
}

pub struct FakeGenerator {
    behavior: GeneratorBehavior,
    calls: AtomicUsize,
}

impl FakeGenerator {
    pub fn new(behavior: GeneratorBehavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ImageGenerator for FakeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<GeneratedImage> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.behavior {
            GeneratorBehavior::Succeed => {
                // Give concurrent callers a chance to interleave
                tokio::task::yield_now().await;
                Ok(GeneratedImage::png(PNG_BYTES.to_vec()))
            }
            GeneratorBehavior::Fail => Err(ApiError::Upstream("provider rejected prompt".to_string())),
            GeneratorBehavior::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(GeneratedImage::png(PNG_BYTES.to_vec()))
            }
        }
    }
}

pub struct FakeGateway {
    fail: bool,
    orders: AtomicUsize,
}

impl FakeGateway {
    pub fn new(fail: bool) -> Self {
        Self {
            fail,
            orders: AtomicUsize::new(0),
        }
    }

    pub fn orders(&self) -> usize {
        self.orders.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_order(&self, request: &OrderRequest) -> Result<OrderInfo> {
        let n = self.orders.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ApiError::Upstream("gateway unavailable".to_string()));
        }
        Ok(OrderInfo {
            id: format!("order_test{}", n),
            amount: request.amount,
            currency: request.currency.clone(),
            receipt: request.receipt.to_string(),
        })
    }

    fn verify_payment(&self, confirmation: &PaymentConfirmation) -> bool {
        verify_signature(
            KEY_SECRET,
            &confirmation.razorpay_order_id,
            &confirmation.razorpay_payment_id,
            &confirmation.razorpay_signature,
        )
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub generator: Arc<FakeGenerator>,
    pub gateway: Arc<FakeGateway>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::build(test_config(), GeneratorBehavior::Succeed, false)
    }

    pub fn with_generator(behavior: GeneratorBehavior) -> Self {
        Self::build(test_config(), behavior, false)
    }

    pub fn with_failing_gateway() -> Self {
        Self::build(test_config(), GeneratorBehavior::Succeed, true)
    }

    pub fn build(config: Config, behavior: GeneratorBehavior, gateway_fails: bool) -> Self {
        let store = Arc::new(MemoryStore::new());
        let generator = Arc::new(FakeGenerator::new(behavior));
        let gateway = Arc::new(FakeGateway::new(gateway_fails));

        let state = AppState::from_backends(
            config,
            Backends {
                users: store.clone(),
                transactions: store.clone(),
                generator: generator.clone(),
                gateway: gateway.clone(),
            },
        );

        Self {
            state,
            store,
            generator,
            gateway,
        }
    }

    /// Insert a user directly, bypassing registration
    pub async fn user_with_credits(&self, credits: i32) -> Uuid {
        self.store
            .create_user(NewUser {
                name: "Test User".to_string(),
                email: format!("{}@example.com", Uuid::new_v4()),
                password_hash: "not-a-real-hash".to_string(),
                credit_balance: credits,
            })
            .await
            .unwrap()
            .id
    }

    pub async fn balance(&self, user_id: Uuid) -> i32 {
        self.store
            .find_user(user_id)
            .await
            .unwrap()
            .unwrap()
            .credit_balance
    }
}
