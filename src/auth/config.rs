use crate::auth::{AuthError, AuthResult};

/// Development-only signing secret used when `JWT_SECRET_KEY` is unset.
/// Debug builds accept it with a loud warning; release builds refuse to start.
const DEV_FALLBACK_SECRET: &str = "wayfarer-dev-secret-do-not-use-in-production";

/// Authentication configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub access_token_ttl_secs: i64,
    pub refresh_token_ttl_secs: i64,
}

impl AuthConfig {
    pub fn from_env() -> AuthResult<Self> {
        let jwt_secret = match std::env::var("JWT_SECRET_KEY") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ => {
                if cfg!(debug_assertions) {
                    log::warn!(
                        "JWT_SECRET_KEY is not set; using the insecure development fallback. \
                         Every token signed with it is forgeable."
                    );
                    DEV_FALLBACK_SECRET.to_string()
                } else {
                    return Err(AuthError::Config(
                        "JWT_SECRET_KEY is required in release builds".into(),
                    ));
                }
            }
        };

        let access_token_ttl_secs = std::env::var("WAYFARER_ACCESS_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(10 * 60);
        let refresh_token_ttl_secs = std::env::var("WAYFARER_REFRESH_TOKEN_TTL_SECS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(30 * 24 * 60 * 60);

        Ok(Self {
            jwt_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
        })
    }
}
