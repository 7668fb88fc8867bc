use rocket::State;
use rocket::post;
use rocket::serde::json::Json;
use rocket_okapi::openapi;

use crate::auth::guards::RefreshTokenCarrier;
use crate::auth::{AuthError, AuthState};
use crate::auth::responses::{
    LoginRequest, LogoutResponse, PublicUser, RegisterRequest, TokenPairResponse,
};
use crate::error::ApiError;

#[openapi(tag = "Auth")]
#[post("/auth/register", data = "<payload>")]
pub async fn register(
    state: &State<AuthState>,
    payload: Json<RegisterRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let user = state
        .service
        .register(
            payload.username.trim(),
            payload.email.trim(),
            &payload.password,
        )
        .await?;
    Ok(Json(user))
}

#[openapi(tag = "Auth")]
#[post("/auth/login", data = "<payload>")]
pub async fn login(
    state: &State<AuthState>,
    payload: Json<LoginRequest>,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let pair = state
        .service
        .login(payload.username.trim(), &payload.password)
        .await?;
    Ok(Json(pair))
}

/// Rotates the presented refresh token: the old token is consumed and a
/// fresh access/refresh pair is returned.
#[openapi(tag = "Auth")]
#[post("/auth/refresh")]
pub async fn refresh(
    state: &State<AuthState>,
    carrier: RefreshTokenCarrier,
) -> Result<Json<TokenPairResponse>, ApiError> {
    let token = carrier
        .0
        .ok_or_else(|| ApiError::from(AuthError::InvalidRefreshToken))?;
    let pair = state.service.refresh(&token).await?;
    Ok(Json(pair))
}

/// Revokes the presented refresh token. Succeeds whether or not a token
/// was supplied or known.
#[openapi(tag = "Auth")]
#[post("/auth/logout")]
pub async fn logout(
    state: &State<AuthState>,
    carrier: RefreshTokenCarrier,
) -> Json<LogoutResponse> {
    state.service.logout(carrier.0.as_deref());
    Json(LogoutResponse {
        message: "logged out".to_string(),
    })
}
