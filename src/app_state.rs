use crate::{
    config::Config,
    models::plans::PlanTable,
    services::{
        AuthService, ClipdropClient, ImageGenerator, ImageService, JWTService, PaymentGateway,
        PaymentService, RazorpayClient,
    },
    store::{MemoryStore, SeaOrmStore, TransactionStore, UserStore},
};
use std::{sync::Arc, time::Duration};

const MEMORY_DATABASE_URL: &str = "memory://";

#[derive(Clone)]
pub struct AppState {
    pub jwt_service: Arc<JWTService>,
    pub auth_service: Arc<AuthService>,
    pub image_service: Arc<ImageService>,
    pub payment_service: Arc<PaymentService>,
    pub config: Arc<Config>,
}

/// Storage and upstream collaborators the services are built on
pub struct Backends {
    pub users: Arc<dyn UserStore>,
    pub transactions: Arc<dyn TransactionStore>,
    pub generator: Arc<dyn ImageGenerator>,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl AppState {
    pub async fn new(config: Config) -> Result<Self, anyhow::Error> {
        let (users, transactions) = if config.database.url == MEMORY_DATABASE_URL {
            tracing::warn!("Using in-memory store; data is lost on restart");
            split_store(Arc::new(MemoryStore::new()))
        } else {
            split_store(Arc::new(SeaOrmStore::connect(&config.database).await?))
        };

        let generator = Arc::new(ClipdropClient::new(&config.image)?);
        let gateway = Arc::new(RazorpayClient::new(&config.payment)?);

        Ok(Self::from_backends(
            config,
            Backends {
                users,
                transactions,
                generator,
                gateway,
            },
        ))
    }

    /// Assemble services over explicit backends
    pub fn from_backends(config: Config, backends: Backends) -> Self {
        let auth_config = Arc::new(config.auth.clone());
        let jwt_service = Arc::new(JWTService::new(auth_config.clone()));

        let auth_service = Arc::new(AuthService::new(
            backends.users.clone(),
            jwt_service.clone(),
            auth_config,
        ));

        let image_service = Arc::new(ImageService::new(
            backends.users.clone(),
            backends.generator,
            Duration::from_millis(config.image.request_timeout_ms),
        ));

        let payment_service = Arc::new(PaymentService::new(
            backends.users,
            backends.transactions,
            backends.gateway,
            PlanTable::from_config(&config.plans),
            config.payment.currency.clone(),
            Duration::from_millis(config.payment.request_timeout_ms),
        ));

        Self {
            jwt_service,
            auth_service,
            image_service,
            payment_service,
            config: Arc::new(config),
        }
    }
}

fn split_store<S>(store: Arc<S>) -> (Arc<dyn UserStore>, Arc<dyn TransactionStore>)
where
    S: UserStore + TransactionStore + 'static,
{
    let users: Arc<dyn UserStore> = store.clone();
    let transactions: Arc<dyn TransactionStore> = store;
    (users, transactions)
}
