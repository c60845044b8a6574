// Library exports for testing and reuse
pub mod app_state;
pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use app_state::{AppState, Backends};
pub use config::Config;
pub use error::{ApiError, Result};
pub use routes::create_router;
