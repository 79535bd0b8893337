pub mod auth;
pub mod error;
pub mod service;

pub use auth::AuthService;
pub use error::AppError;
pub use service::*;
