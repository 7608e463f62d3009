use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{PasswordResetToken, RefreshToken, Role, User};
use crate::error::AuthError;

impl User {
    /// Find a user by email. Exact match; emails are compared as stored.
    pub async fn find_by_email(db: &PgPool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, password_hash, created_at, last_login
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, role, password_hash, created_at, last_login
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Create a new user with a hashed password. The unique index on email
    /// is authoritative: a concurrent duplicate registration loses here, not
    /// at the handler's earlier existence check.
    pub async fn create(
        db: &PgPool,
        email: &str,
        name: &str,
        role: Role,
        password_hash: &str,
    ) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, email, name, role, password_hash, created_at, last_login
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(role)
        .bind(password_hash)
        .fetch_one(db)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AuthError::DuplicateEmail;
                }
            }
            AuthError::Internal(e.into())
        })?;
        Ok(user)
    }

    /// In-place hash replacement. Takes any executor so the reset-confirm
    /// transaction can run it alongside the token update.
    pub async fn update_password<'e, E>(
        executor: E,
        user_id: Uuid,
        password_hash: &str,
    ) -> anyhow::Result<()>
    where
        E: sqlx::PgExecutor<'e>,
    {
        sqlx::query("UPDATE users SET password_hash = $1 WHERE id = $2")
            .bind(password_hash)
            .bind(user_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn touch_last_login(
        db: &PgPool,
        user_id: Uuid,
        at: OffsetDateTime,
    ) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET last_login = $1 WHERE id = $2")
            .bind(at)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(())
    }
}

impl RefreshToken {
    pub async fn create(
        db: &PgPool,
        token: &str,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<RefreshToken> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, expires_at, revoked, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    pub async fn find(db: &PgPool, token: &str) -> anyhow::Result<Option<RefreshToken>> {
        let record = sqlx::query_as::<_, RefreshToken>(
            r#"
            SELECT token, user_id, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Flips `revoked` to true, permanently. The guarded update keeps a
    /// concurrent double-logout from both claiming the flip; the loser is
    /// classified by a follow-up read.
    pub async fn revoke(db: &PgPool, token: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE token = $1 AND revoked = FALSE",
        )
        .bind(token)
        .execute(db)
        .await?;

        if result.rows_affected() == 1 {
            return Ok(());
        }
        match Self::find(db, token).await? {
            Some(_) => Err(AuthError::RefreshRevoked),
            None => Err(AuthError::RefreshInvalid),
        }
    }
}

impl PasswordResetToken {
    pub async fn create(
        db: &PgPool,
        token: &str,
        user_id: Uuid,
        expires_at: OffsetDateTime,
    ) -> anyhow::Result<PasswordResetToken> {
        let record = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING token, user_id, expires_at, used, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(db)
        .await?;
        Ok(record)
    }

    pub async fn find(db: &PgPool, token: &str) -> anyhow::Result<Option<PasswordResetToken>> {
        let record = sqlx::query_as::<_, PasswordResetToken>(
            r#"
            SELECT token, user_id, expires_at, used, created_at
            FROM password_reset_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(db)
        .await?;
        Ok(record)
    }

    /// Guarded flip of the `used` flag. Returns false when the token was
    /// already burned, which callers must treat as a failed confirm.
    pub async fn mark_used<'e, E>(executor: E, token: &str) -> anyhow::Result<bool>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used = TRUE WHERE token = $1 AND used = FALSE",
        )
        .bind(token)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Applies the new password hash and burns the token as one transaction:
    /// either both land or neither does.
    pub async fn consume(
        db: &PgPool,
        token: &str,
        user_id: Uuid,
        new_password_hash: &str,
    ) -> Result<(), AuthError> {
        let mut tx = db.begin().await?;
        User::update_password(&mut *tx, user_id, new_password_hash).await?;
        let burned = Self::mark_used(&mut *tx, token).await?;
        if !burned {
            // raced with another confirm; dropping the tx rolls back the hash
            return Err(AuthError::ResetInvalid);
        }
        tx.commit().await?;
        Ok(())
    }
}
