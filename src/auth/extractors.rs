use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRef, FromRequest, FromRequestParts, Request},
    http::request::Parts,
};
use tracing::warn;

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::error::AuthError;
use crate::state::AppState;

/// Request-body extractor that keeps deserialization failures inside the
/// `{"detail": …}` envelope. Missing fields, wrong types, and syntactically
/// broken JSON all surface as validation errors.
pub struct AppJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(AppJson(value)),
            Err(rejection) => Err(AuthError::Validation(rejection.body_text())),
        }
    }
}

/// Authenticates a request from its bearer access token and loads the
/// account. Missing header, bad scheme, bad signature, expiry, a refresh
/// token in the access slot, and a deleted user all collapse to the same
/// unauthorized rejection.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(AuthError::Unauthorized)?;

        let token = header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .ok_or(AuthError::Unauthorized)?;

        let keys = JwtKeys::from_ref(state);
        let claims = keys.verify(token).map_err(|e| {
            warn!(reason = %e, "access token rejected");
            AuthError::Unauthorized
        })?;
        if claims.is_refresh() {
            warn!("refresh token presented as an access token");
            return Err(AuthError::Unauthorized);
        }

        let user = User::find_by_id(&state.db, claims.user_id)
            .await
            .map_err(AuthError::Internal)?
            .ok_or(AuthError::Unauthorized)?;

        Ok(CurrentUser(user))
    }
}
