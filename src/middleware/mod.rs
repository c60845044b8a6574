// Middleware modules
pub mod error_response;
pub mod jwt_auth;
pub mod logging;

// Export JWT auth middleware components
pub use jwt_auth::{jwt_auth_middleware, UserIdentity};

// Export error shaping middleware
pub use error_response::error_response_middleware;

// Export logging middleware
pub use logging::logging_middleware;
