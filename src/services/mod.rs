// Service modules
pub mod auth_service;
pub mod image_provider;
pub mod image_service;
pub mod jwt_service;
pub mod payment_gateway;
pub mod payment_service;

pub use auth_service::AuthService;
pub use image_provider::{ClipdropClient, ImageGenerator};
pub use image_service::ImageService;
pub use jwt_service::JWTService;
pub use payment_gateway::{PaymentGateway, RazorpayClient};
pub use payment_service::PaymentService;
