//! Account self-service routes for the authenticated caller.

use rocket::State;
use rocket::serde::json::Json;
use rocket::{get, put};
use rocket_okapi::openapi;

use crate::auth::guards::AuthUser;
use crate::auth::responses::{ChangePasswordRequest, UserProfile};
use crate::auth::AuthState;
use crate::error::ApiError;

/// Profile of the caller identified by the bearer access token.
#[openapi(tag = "Users")]
#[get("/users/me")]
pub async fn me(user: AuthUser) -> Json<UserProfile> {
    Json(UserProfile {
        id: user.id,
        username: user.username,
        email: user.email,
        roles: user.roles,
    })
}

/// Changes the caller's password and revokes all of their live sessions.
#[openapi(tag = "Users")]
#[put("/users/me/password", data = "<payload>")]
pub async fn change_password(
    state: &State<AuthState>,
    user: AuthUser,
    payload: Json<ChangePasswordRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    state
        .service
        .change_password(
            &user.username,
            &payload.current_password,
            &payload.new_password,
        )
        .await?;

    Ok(Json(UserProfile {
        id: user.id,
        username: user.username,
        email: user.email,
        roles: user.roles,
    }))
}
