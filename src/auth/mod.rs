//! Authentication subsystem: configuration, password hashing, token
//! minting, the refresh-token registry, the orchestrating service,
//! Rocket request guards, and HTTP route handlers.

use std::sync::Arc;

pub mod config;
pub mod error;
pub mod guards;
pub mod jwt;
pub mod passwords;
pub mod registry;
pub mod responses;
pub mod routes;
pub mod service;

pub use config::AuthConfig;
pub use error::{AuthError, AuthResult};
pub use guards::{AuthUser, RefreshTokenCarrier, RequireAdmin};
pub use jwt::TokenIssuer;
pub use passwords::PasswordService;
pub use registry::RefreshTokenRegistry;
pub use service::AuthService;

use crate::users::UserStore;

/// Rocket-managed handle to the authentication service. Built once at
/// startup; the registry it carries lives for the process and is gone
/// after a restart.
#[derive(Clone)]
pub struct AuthState {
    pub config: AuthConfig,
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(config: AuthConfig, users: Arc<dyn UserStore>) -> AuthResult<Self> {
        let passwords = PasswordService::new()?;
        let issuer = TokenIssuer::from_config(&config);
        let registry = RefreshTokenRegistry::new();
        let service = Arc::new(AuthService::new(passwords, issuer, registry, users));

        Ok(Self { config, service })
    }
}
