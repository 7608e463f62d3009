use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AccessTokenResponse, LoginRequest, LogoutRequest, MessageResponse,
            PasswordResetConfirm, PasswordResetRequest, RefreshRequest, RegisterRequest,
            ResetTokenResponse, TokenPairResponse, UserResponse,
        },
        extractors::AppJson,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo_types::{PasswordResetToken, RefreshToken, Role, User},
        reset::generate_reset_token,
    },
    error::AuthError,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
        .route("/auth/password-reset-request", post(password_reset_request))
        .route("/auth/password-reset-confirm", post(password_reset_confirm))
}

fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    email.chars().count() <= 255 && EMAIL_RE.is_match(email)
}

fn validate_password(password: &str) -> Result<(), AuthError> {
    let len = password.chars().count();
    if len < 8 {
        return Err(AuthError::Validation(
            "Password must be at least 8 characters".into(),
        ));
    }
    if len > 100 {
        return Err(AuthError::Validation(
            "Password must be at most 100 characters".into(),
        ));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<UserResponse>), AuthError> {
    if !is_valid_email(&payload.email) {
        warn!("registration with invalid email shape");
        return Err(AuthError::Validation("Invalid email address".into()));
    }
    let name_len = payload.name.chars().count();
    if name_len == 0 || name_len > 100 {
        return Err(AuthError::Validation(
            "Name must be between 1 and 100 characters".into(),
        ));
    }
    validate_password(&payload.password)?;
    let role: Role = payload.role.parse().map_err(AuthError::Validation)?;

    if User::find_by_email(&state.db, &payload.email).await?.is_some() {
        warn!("registration against an existing email");
        return Err(AuthError::DuplicateEmail);
    }

    let hash = hash_password(&payload.password)?;
    // the unique index still decides races lost between the check above and here
    let user = User::create(&state.db, &payload.email, &payload.name, role, &hash).await?;

    info!(user_id = %user.id, role = %user.role, "user registered");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<TokenPairResponse>, AuthError> {
    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            warn!("login with unknown email");
            return Err(AuthError::InvalidCredentials);
        }
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(user_id = %user.id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }

    User::touch_last_login(&state.db, user.id, OffsetDateTime::now_utc()).await?;

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign_access(&user)?;
    let refresh_token = keys.sign_refresh(&user)?;

    let expires_at =
        OffsetDateTime::now_utc() + TimeDuration::seconds(keys.refresh_ttl.as_secs() as i64);
    RefreshToken::create(&state.db, &refresh_token, user.id, expires_at).await?;

    info!(user_id = %user.id, "user logged in");
    Ok(Json(TokenPairResponse {
        access_token,
        refresh_token,
        token_type: "bearer".into(),
    }))
}

/// Exchanges a refresh token for a fresh access token. The checks run in a
/// fixed order: signature and kind, store presence, revocation, store
/// expiry, then user existence. Only revocation gets its own message.
#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    AppJson(payload): AppJson<RefreshRequest>,
) -> Result<Json<AccessTokenResponse>, AuthError> {
    let keys = JwtKeys::from_ref(&state);
    keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(reason = %e, "refresh token failed verification");
        AuthError::RefreshInvalid
    })?;

    let stored = RefreshToken::find(&state.db, &payload.refresh_token)
        .await?
        .ok_or(AuthError::RefreshInvalid)?;
    if stored.revoked {
        warn!(user_id = %stored.user_id, "refresh with a revoked token");
        return Err(AuthError::RefreshRevoked);
    }
    if stored.is_expired(OffsetDateTime::now_utc()) {
        return Err(AuthError::RefreshInvalid);
    }

    let user = User::find_by_id(&state.db, stored.user_id)
        .await?
        .ok_or(AuthError::RefreshInvalid)?;

    // a new access token only; the refresh token is not rotated
    let access_token = keys.sign_access(&user)?;

    info!(user_id = %user.id, "access token refreshed");
    Ok(Json(AccessTokenResponse {
        access_token,
        token_type: "bearer".into(),
    }))
}

/// Revokes the presented refresh token. Purely a store operation: no
/// signature check, the lookup itself decides. Already-issued access tokens
/// stay valid until their own expiry.
#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LogoutRequest>,
) -> Result<Json<MessageResponse>, AuthError> {
    RefreshToken::revoke(&state.db, &payload.refresh_token).await?;
    info!("refresh token revoked");
    Ok(Json(MessageResponse {
        message: "Successfully logged out".into(),
    }))
}

/// Issues a reset token for a known email; answers identically for an
/// unknown one without touching the store.
#[instrument(skip(state, payload))]
pub async fn password_reset_request(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordResetRequest>,
) -> Result<Json<ResetTokenResponse>, AuthError> {
    if !is_valid_email(&payload.email) {
        return Err(AuthError::Validation("Invalid email address".into()));
    }

    let message = "If that email is registered, a reset token has been issued".to_string();

    let user = match User::find_by_email(&state.db, &payload.email).await? {
        Some(u) => u,
        None => {
            info!("password reset requested for an unknown email");
            return Ok(Json(ResetTokenResponse {
                message,
                reset_token: String::new(),
            }));
        }
    };

    let token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + TimeDuration::hours(state.config.auth.reset_ttl_hours);
    PasswordResetToken::create(&state.db, &token, user.id, expires_at).await?;

    if let Err(e) = state.notifier.deliver_reset_token(&user.email, &token).await {
        warn!(user_id = %user.id, error = %e, "reset token delivery failed");
    }

    info!(user_id = %user.id, "password reset token issued");
    Ok(Json(ResetTokenResponse {
        message,
        reset_token: token,
    }))
}

/// Redeems a reset token. Checks run in order: token exists, not used, not
/// expired, user exists; all four surface the same generic error. The hash
/// update and the used flag land in one transaction.
#[instrument(skip(state, payload))]
pub async fn password_reset_confirm(
    State(state): State<AppState>,
    AppJson(payload): AppJson<PasswordResetConfirm>,
) -> Result<Json<MessageResponse>, AuthError> {
    validate_password(&payload.new_password)?;

    let stored = PasswordResetToken::find(&state.db, &payload.reset_token)
        .await?
        .ok_or(AuthError::ResetInvalid)?;
    if stored.used {
        warn!(user_id = %stored.user_id, "reset confirm with a used token");
        return Err(AuthError::ResetInvalid);
    }
    if stored.is_expired(OffsetDateTime::now_utc()) {
        return Err(AuthError::ResetInvalid);
    }
    let user = User::find_by_id(&state.db, stored.user_id)
        .await?
        .ok_or(AuthError::ResetInvalid)?;

    let hash = hash_password(&payload.new_password)?;
    PasswordResetToken::consume(&state.db, &stored.token, user.id, &hash).await?;

    info!(user_id = %user.id, "password reset completed");
    Ok(Json(MessageResponse {
        message: "Password has been reset successfully".into(),
    }))
}
