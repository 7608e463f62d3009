use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};

/// Type of JWT: access or refresh.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload.
///
/// Access tokens put the email in `sub` and carry the role; refresh tokens
/// put the user-id string in `sub` and a `type = "refresh"` marker instead.
/// `iat`, `exp` and `jti` are stamped at signing time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub user_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<TokenKind>,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
}

impl Claims {
    /// Identity claims for an access token. Absence of the `type` marker is
    /// what an access token looks like on the wire.
    pub fn access(user: &User) -> Self {
        Self {
            sub: user.email.clone(),
            user_id: user.id,
            role: Some(user.role),
            kind: None,
            iat: 0,
            exp: 0,
            jti: String::new(),
        }
    }

    /// Identity claims for a refresh token.
    pub fn refresh(user: &User) -> Self {
        Self {
            sub: user.id.to_string(),
            user_id: user.id,
            role: None,
            kind: Some(TokenKind::Refresh),
            iat: 0,
            exp: 0,
            jti: String::new(),
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.kind == Some(TokenKind::Refresh)
    }
}
