use std::sync::Arc;

use crate::auth::jwt::TokenIssuer;
use crate::auth::passwords::PasswordService;
use crate::auth::registry::RefreshTokenRegistry;
use crate::auth::responses::{PublicUser, Role, TokenPairResponse, UserProfile};
use crate::auth::{AuthError, AuthResult};
use crate::users::{NewUser, User, UserStore};

const USERNAME_MIN_LEN: usize = 3;
const USERNAME_MAX_LEN: usize = 32;
const PASSWORD_MIN_LEN: usize = 8;

/// Scheme label prefixed onto access tokens in login/refresh responses.
const BEARER_PREFIX: &str = "Bearer ";

/// Orchestrates registration, login, refresh-token rotation, logout, and
/// the account-maintenance operations over the password service, token
/// issuer, registry, and user store.
pub struct AuthService {
    passwords: PasswordService,
    issuer: TokenIssuer,
    registry: RefreshTokenRegistry,
    users: Arc<dyn UserStore>,
}

impl AuthService {
    pub fn new(
        passwords: PasswordService,
        issuer: TokenIssuer,
        registry: RefreshTokenRegistry,
        users: Arc<dyn UserStore>,
    ) -> Self {
        Self {
            passwords,
            issuer,
            registry,
            users,
        }
    }

    pub fn issuer(&self) -> &TokenIssuer {
        &self.issuer
    }

    pub fn registry(&self) -> &RefreshTokenRegistry {
        &self.registry
    }

    pub fn users(&self) -> &Arc<dyn UserStore> {
        &self.users
    }

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> AuthResult<PublicUser> {
        validate_username(username)?;
        validate_email(email)?;
        validate_password(password)?;

        if self.users.exists_by_username(username).await? {
            return Err(AuthError::UsernameTaken);
        }
        if self.users.exists_by_email(email).await? {
            return Err(AuthError::EmailTaken);
        }

        let password_hash = self.passwords.hash_password(password)?;
        let user = self
            .users
            .save(NewUser {
                username: username.to_string(),
                email: email.to_lowercase(),
                password_hash,
                roles: vec![Role::User],
            })
            .await?;

        log::info!("registered user '{}'", user.username);

        Ok(PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }

    /// Looks up by username first, then by email when the input contains
    /// `@`. Unknown account and wrong password collapse into the same
    /// `InvalidCredentials` failure so callers cannot enumerate users.
    pub async fn login(
        &self,
        username_or_email: &str,
        password: &str,
    ) -> AuthResult<TokenPairResponse> {
        let user = self.lookup_account(username_or_email).await?;
        let user = user.ok_or(AuthError::InvalidCredentials)?;

        if !self.passwords.verify_password(password, &user.password_hash) {
            return Err(AuthError::InvalidCredentials);
        }

        self.issue_pair(&user.username)
    }

    /// Rotates a refresh token. `registry.take` is the gate: the first
    /// caller to consume the entry wins, any concurrent caller presenting
    /// the same token fails. Registry membership is the sole validity
    /// authority here; the presented token's signature is not re-checked.
    pub async fn refresh(&self, refresh_token: &str) -> AuthResult<TokenPairResponse> {
        let username = self
            .registry
            .take(refresh_token)
            .ok_or(AuthError::InvalidRefreshToken)?;

        // The entry is already consumed, so a vanished account leaves no
        // dangling registration behind.
        if !self.users.exists_by_username(&username).await? {
            return Err(AuthError::UserNotFound);
        }

        self.issue_pair(&username)
    }

    /// Idempotent revocation; absent or missing tokens are a no-op.
    pub fn logout(&self, refresh_token: Option<&str>) {
        if let Some(token) = refresh_token {
            self.registry.remove(token);
        }
    }

    /// Verifies the current password, stores the new digest, and revokes
    /// every live session of the account so stolen refresh tokens die with
    /// the old password.
    pub async fn change_password(
        &self,
        username: &str,
        current_password: &str,
        new_password: &str,
    ) -> AuthResult<()> {
        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self
            .passwords
            .verify_password(current_password, &user.password_hash)
        {
            return Err(AuthError::InvalidCredentials);
        }
        validate_password(new_password)?;

        let password_hash = self.passwords.hash_password(new_password)?;
        self.users
            .save(NewUser {
                username: user.username.clone(),
                email: user.email,
                password_hash,
                roles: user.roles,
            })
            .await?;

        let revoked = self.registry.remove_user(&user.username);
        log::info!(
            "password changed for '{}', revoked {} session(s)",
            user.username,
            revoked
        );
        Ok(())
    }

    pub async fn update_roles(&self, username: &str, roles: &[Role]) -> AuthResult<UserProfile> {
        if roles.is_empty() {
            return Err(AuthError::Validation("role set must not be empty".into()));
        }

        let user = self
            .users
            .find_by_username(username)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let updated = self
            .users
            .save(NewUser {
                username: user.username,
                email: user.email,
                password_hash: user.password_hash,
                roles: roles.to_vec(),
            })
            .await?;

        Ok(UserProfile {
            id: updated.id,
            username: updated.username,
            email: updated.email,
            roles: updated.roles,
        })
    }

    async fn lookup_account(&self, username_or_email: &str) -> AuthResult<Option<User>> {
        if let Some(user) = self.users.find_by_username(username_or_email).await? {
            return Ok(Some(user));
        }
        if username_or_email.contains('@') {
            return Ok(self
                .users
                .find_by_email(&username_or_email.to_lowercase())
                .await?);
        }
        Ok(None)
    }

    fn issue_pair(&self, username: &str) -> AuthResult<TokenPairResponse> {
        let access = self.issuer.issue_access(username)?;
        let refresh = self.issuer.issue_refresh(username)?;
        self.registry.put(refresh.token.clone(), username);

        Ok(TokenPairResponse {
            access_token: format!("{BEARER_PREFIX}{}", access.token),
            refresh_token: refresh.token,
        })
    }
}

fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(AuthError::Validation(format!(
            "username must be {USERNAME_MIN_LEN}-{USERNAME_MAX_LEN} characters"
        )));
    }
    if !username
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    {
        return Err(AuthError::Validation(
            "username may only contain letters, digits, '_' and '-'".into(),
        ));
    }
    Ok(())
}

fn validate_email(email: &str) -> AuthResult<()> {
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(()),
        _ => Err(AuthError::Validation("email address is malformed".into())),
    }
}

fn validate_password(password: &str) -> AuthResult<()> {
    let long_enough = password.chars().count() >= PASSWORD_MIN_LEN;
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());

    if long_enough && has_lower && has_upper && has_digit {
        Ok(())
    } else {
        Err(AuthError::Validation(format!(
            "password must be at least {PASSWORD_MIN_LEN} characters \
             with a lowercase letter, an uppercase letter, and a digit"
        )))
    }
}
