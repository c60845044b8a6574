// Request/Response models
pub mod auth;
pub mod image;
pub mod payment;
pub mod plans;
