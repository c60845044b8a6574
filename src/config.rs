use serde::Deserialize;
use std::collections::HashSet;

/// Time a handler needs after its upstream call returns (debit, response)
const HANDLER_HEADROOM_MS: u64 = 1_000;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub image: ImageConfig,
    pub payment: PaymentConfig,
    pub auth: AuthConfig,
    pub plans: Vec<PlanConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whole-request timeout applied by the router
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Answer business errors with HTTP 200, as older web clients expect
    #[serde(default)]
    pub legacy_error_status: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Postgres/SQLite connection string, or `memory://` for the in-process store
    pub url: String,
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageConfig {
    pub api_key: String,
    #[serde(default = "default_image_api_base")]
    pub api_base: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    pub key_id: String,
    pub key_secret: String,
    #[serde(default = "default_payment_api_base")]
    pub api_base: String,
    pub currency: String,
    pub request_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiration_minutes: u64,
    /// Credits granted at registration
    pub starting_credits: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PlanConfig {
    pub id: String,
    #[serde(default)]
    pub description: String,
    /// Price in minor currency units (e.g. cents, paise)
    pub price: i64,
    pub credits: i32,
}

fn default_request_timeout_secs() -> u64 {
    90
}

fn default_true() -> bool {
    true
}

fn default_image_api_base() -> String {
    "https://clipdrop-api.co".to_string()
}

fn default_payment_api_base() -> String {
    "https://api.razorpay.com".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if it exists (for environment variable overrides)
        dotenvy::dotenv().ok();

        // config.yml carries non-secret defaults; keys come from the environment
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("IMAGIFY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the server cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid =
            |msg: &str| -> Result<(), ConfigError> { Err(ConfigError::Invalid(msg.to_string())) };

        if self.server.port == 0 {
            return invalid("server.port must be non-zero");
        }
        if self.server.request_timeout_secs == 0 {
            return invalid("server.request_timeout_secs must be positive");
        }
        if self.database.url.trim().is_empty() {
            return invalid("database.url is required");
        }
        if self.image.api_key.trim().is_empty() {
            return invalid("image.api_key is required");
        }
        if self.image.request_timeout_ms == 0 {
            return invalid("image.request_timeout_ms must be positive");
        }
        if self.payment.key_id.trim().is_empty() || self.payment.key_secret.trim().is_empty() {
            return invalid("payment.key_id and payment.key_secret are required");
        }
        if self.payment.currency.trim().is_empty() {
            return invalid("payment.currency is required");
        }
        if self.payment.request_timeout_ms == 0 {
            return invalid("payment.request_timeout_ms must be positive");
        }

        // Upstream calls must give up before the router-wide timeout drops the
        // handler, or a request could be cut off after its credit moved
        let request_budget_ms = self.server.request_timeout_secs.saturating_mul(1000);
        for (name, timeout_ms) in [
            ("image.request_timeout_ms", self.image.request_timeout_ms),
            ("payment.request_timeout_ms", self.payment.request_timeout_ms),
        ] {
            if timeout_ms.saturating_add(HANDLER_HEADROOM_MS) > request_budget_ms {
                return Err(ConfigError::Invalid(format!(
                    "{} ({}ms) must be at least {}ms below server.request_timeout_secs ({}s)",
                    name, timeout_ms, HANDLER_HEADROOM_MS, self.server.request_timeout_secs
                )));
            }
        }

        if self.auth.jwt_secret.len() < 32 {
            return invalid("auth.jwt_secret must be at least 32 bytes");
        }
        if self.auth.token_expiration_minutes == 0 {
            return invalid("auth.token_expiration_minutes must be positive");
        }
        if self.auth.starting_credits < 0 {
            return invalid("auth.starting_credits must not be negative");
        }

        validate_plans(&self.plans)
    }
}

fn validate_plans(plans: &[PlanConfig]) -> Result<(), ConfigError> {
    if plans.is_empty() {
        return Err(ConfigError::Invalid("at least one plan is required".into()));
    }

    let mut seen = HashSet::new();
    for plan in plans {
        if plan.id.trim().is_empty() {
            return Err(ConfigError::Invalid("plan id must not be empty".into()));
        }
        if !seen.insert(plan.id.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "duplicate plan id: {}",
                plan.id
            )));
        }
        if plan.price <= 0 || plan.credits <= 0 {
            return Err(ConfigError::Invalid(format!(
                "plan {} must have a positive price and credit quantity",
                plan.id
            )));
        }
    }

    Ok(())
}
