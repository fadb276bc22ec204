pub mod auth_service;
pub mod auth_service_impl;
pub mod token_service;

pub use auth_service::{AuthError, AuthService, LoginResult};
pub use auth_service_impl::SeaOrmAuthService;
pub use token_service::{Claims, Identity, TokenService, Verification};
