use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

/// Request body for user registration. The role arrives as a plain string
/// so an unknown value is a validation error, not a deserialization one.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub name: String,
    pub password: String,
    pub role: String,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for logout.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Request body for a password-reset request.
#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

/// Request body for a password-reset confirmation.
#[derive(Debug, Deserialize)]
pub struct PasswordResetConfirm {
    pub reset_token: String,
    pub new_password: String,
}

/// Token pair returned by login.
#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

/// Returned by refresh. Deliberately no refresh token: the presented one
/// stays valid until it expires or is revoked.
#[derive(Debug, Serialize)]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
}

/// Public view of a user; password material never appears here.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: Role,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Reset requests answer uniformly; `reset_token` is the empty string for
/// unknown emails so the two cases share one shape.
#[derive(Debug, Serialize)]
pub struct ResetTokenResponse {
    pub message: String,
    pub reset_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_response_exposes_no_password_material() {
        let user = User {
            id: Uuid::new_v4(),
            email: "watson@example.com".into(),
            name: "Joan Watson".into(),
            role: Role::Student,
            password_hash: "argon2-material".into(),
            created_at: OffsetDateTime::now_utc(),
            last_login: None,
        };
        let response = UserResponse::from(user);
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("watson@example.com"));
        assert!(json.contains("\"role\":\"student\""));
        assert!(!json.contains("password"));
        assert!(!json.contains("argon2-material"));
    }

    #[test]
    fn created_at_serializes_as_rfc3339() {
        let user = User {
            id: Uuid::new_v4(),
            email: "w@example.com".into(),
            name: "W".into(),
            role: Role::Teacher,
            password_hash: "h".into(),
            created_at: time::macros::datetime!(2025-06-01 12:00:00 UTC),
            last_login: None,
        };
        let v = serde_json::to_value(UserResponse::from(user)).unwrap();
        assert_eq!(v["created_at"], "2025-06-01T12:00:00Z");
    }
}
