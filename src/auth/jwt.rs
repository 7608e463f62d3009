use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::auth::claims::{Claims, TokenKind};
use crate::auth::repo_types::User;
use crate::error::TokenError;
use crate::state::AppState;

/// Signing and verification material plus token lifetimes, derived from
/// config once per use. Access tokens are never persisted; everything a
/// verifier needs is in here.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub algorithm: Algorithm,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let cfg = &state.config.auth;
        let algorithm = cfg.algorithm.parse::<Algorithm>().unwrap_or_else(|_| {
            warn!(algorithm = %cfg.algorithm, "unknown JWT algorithm, falling back to HS256");
            Algorithm::HS256
        });
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            algorithm,
            access_ttl: Duration::from_secs((cfg.access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((cfg.refresh_ttl_days as u64) * 24 * 60 * 60),
        }
    }
}

impl JwtKeys {
    /// Signs `claims` after stamping a fresh `iat`, `exp = now + ttl` and
    /// random `jti`.
    pub fn issue(&self, claims: Claims, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            jti: Uuid::new_v4().to_string(),
            ..claims
        };
        let token = encode(&Header::new(self.algorithm), &claims, &self.encoding)?;
        debug!(user_id = %claims.user_id, kind = ?claims.kind, "jwt signed");
        Ok(token)
    }

    fn sign_with_kind(&self, user: &User, kind: TokenKind) -> anyhow::Result<String> {
        let (claims, ttl) = match kind {
            TokenKind::Access => (Claims::access(user), self.access_ttl),
            TokenKind::Refresh => (Claims::refresh(user), self.refresh_ttl),
        };
        self.issue(claims, ttl)
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Access)
    }

    pub fn sign_refresh(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Refresh)
    }

    /// Checks signature and expiry. Signature validity is necessary but not
    /// sufficient for refresh tokens, which are re-checked against the
    /// store by the caller.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    /// `verify` plus the refresh kind gate.
    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if !claims.is_refresh() {
            return Err(TokenError::WrongKind);
        }
        Ok(claims)
    }
}
