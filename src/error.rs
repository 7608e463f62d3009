use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// User-facing failures of the session lifecycle.
///
/// Login and token failures are deliberately coarse: `InvalidCredentials`
/// covers both unknown email and wrong password, `Unauthorized` covers every
/// access-token failure, and `ResetInvalid` covers every reset-token failure,
/// so responses never reveal whether an account or token exists. Revoked
/// refresh tokens are the one exception with a distinguishing message.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    Validation(String),
    #[error("Email already registered")]
    DuplicateEmail,
    #[error("Incorrect email or password")]
    InvalidCredentials,
    #[error("Could not validate credentials")]
    Unauthorized,
    #[error("Refresh token has been revoked")]
    RefreshRevoked,
    #[error("Invalid or expired refresh token")]
    RefreshInvalid,
    #[error("Invalid or expired reset token")]
    ResetInvalid,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    fn status(&self) -> StatusCode {
        match self {
            AuthError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials
            | AuthError::Unauthorized
            | AuthError::RefreshRevoked
            | AuthError::RefreshInvalid
            | AuthError::ResetInvalid => StatusCode::UNAUTHORIZED,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            AuthError::Internal(e) => {
                error!(error = ?e, "internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Internal(e.into())
    }
}

/// Verification failures of the token layer, kept distinct so callers can
/// log the real cause before collapsing to a generic response.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TokenError {
    #[error("invalid signature")]
    InvalidSignature,
    #[error("token expired")]
    Expired,
    #[error("malformed token")]
    Malformed,
    #[error("not a refresh token")]
    WrongKind,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match e.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        assert_eq!(
            AuthError::Validation("bad input".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(AuthError::DuplicateEmail.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AuthError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(AuthError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::RefreshRevoked.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::RefreshInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::ResetInvalid.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn revoked_refresh_message_names_revocation() {
        assert!(AuthError::RefreshRevoked.to_string().contains("revoked"));
    }

    #[test]
    fn access_token_message_names_credentials() {
        assert!(AuthError::Unauthorized.to_string().contains("credential"));
    }

    #[tokio::test]
    async fn internal_errors_hide_details_from_clients() {
        let resp = AuthError::Internal(anyhow::anyhow!("db exploded")).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["detail"], "Internal server error");
    }

    #[tokio::test]
    async fn responses_carry_a_detail_field() {
        let resp = AuthError::InvalidCredentials.into_response();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let v: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(v["detail"], "Incorrect email or password");
    }

    #[test]
    fn jwt_errors_map_onto_the_three_verify_conditions() {
        use jsonwebtoken::errors::{Error, ErrorKind};
        assert_eq!(
            TokenError::from(Error::from(ErrorKind::ExpiredSignature)),
            TokenError::Expired
        );
        assert_eq!(
            TokenError::from(Error::from(ErrorKind::InvalidSignature)),
            TokenError::InvalidSignature
        );
        assert_eq!(
            TokenError::from(Error::from(ErrorKind::InvalidToken)),
            TokenError::Malformed
        );
    }
}
