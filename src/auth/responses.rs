use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Closed role set. The `ROLE_` prefix is a wire/database convention only;
/// code works with the enum.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_MODERATOR")]
    Moderator,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
}

impl Role {
    pub fn as_wire(&self) -> &'static str {
        match self {
            Role::User => "ROLE_USER",
            Role::Moderator => "ROLE_MODERATOR",
            Role::Admin => "ROLE_ADMIN",
        }
    }

    pub fn from_wire(wire: &str) -> Option<Self> {
        match wire {
            "ROLE_USER" => Some(Role::User),
            "ROLE_MODERATOR" => Some(Role::Moderator),
            "ROLE_ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Username, or email when the value contains `@`.
    pub username: String,
    pub password: String,
}

/// Access/refresh pair returned by login and refresh. The access token
/// already carries the `Bearer ` scheme label.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
}

/// Registration result: identity only, never the password digest.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: i32,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRolesRequest {
    pub roles: Vec<Role>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogoutResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_wire_format_round_trips() {
        for role in [Role::User, Role::Moderator, Role::Admin] {
            assert_eq!(Role::from_wire(role.as_wire()), Some(role));
        }
        assert_eq!(Role::from_wire("ROLE_SUPERUSER"), None);

        let json = serde_json::to_string(&Role::Admin).expect("serialize");
        assert_eq!(json, "\"ROLE_ADMIN\"");
        let parsed: Role = serde_json::from_str("\"ROLE_MODERATOR\"").expect("deserialize");
        assert_eq!(parsed, Role::Moderator);
    }
}
