//! Administrative endpoints for session oversight and role management.
//! Every handler is gated by the `RequireAdmin` guard.

use rocket::serde::json::Json;
use rocket::{State, delete, get, put};
use rocket_okapi::okapi::schemars::JsonSchema;
use rocket_okapi::openapi;
use serde::{Deserialize, Serialize};

use crate::auth::AuthState;
use crate::auth::guards::RequireAdmin;
use crate::auth::responses::{UpdateRolesRequest, UserProfile};
use crate::error::ApiError;

/// Snapshot of the refresh-token registry.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionOverviewResponse {
    /// Number of live refresh tokens across all users.
    pub active_sessions: usize,
}

/// Result of revoking one user's sessions.
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevokeSessionsResponse {
    /// Number of refresh tokens removed.
    pub revoked: usize,
}

#[openapi(tag = "Admin")]
#[get("/admin/sessions")]
pub async fn session_overview(
    state: &State<AuthState>,
    _admin: RequireAdmin,
) -> Json<SessionOverviewResponse> {
    Json(SessionOverviewResponse {
        active_sessions: state.service.registry().len(),
    })
}

/// Drops every live refresh token owned by the username. The count is
/// zero when the user has no sessions or does not exist; revocation is
/// idempotent either way.
#[openapi(tag = "Admin")]
#[delete("/admin/sessions/<username>")]
pub async fn revoke_user_sessions(
    state: &State<AuthState>,
    _admin: RequireAdmin,
    username: String,
) -> Json<RevokeSessionsResponse> {
    let revoked = state.service.registry().remove_user(&username);
    log::info!("admin revoked {} session(s) for '{}'", revoked, username);
    Json(RevokeSessionsResponse { revoked })
}

#[openapi(tag = "Admin")]
#[put("/admin/users/<username>/roles", data = "<payload>")]
pub async fn update_roles(
    state: &State<AuthState>,
    _admin: RequireAdmin,
    username: String,
    payload: Json<UpdateRolesRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let profile = state.service.update_roles(&username, &payload.roles).await?;
    Ok(Json(profile))
}
