//! Refresh token repository: the session-lifecycle persistence port and
//! its PostgreSQL adapter.
//!
//! Revocation is monotonic: rows are never deleted and `revoked` never
//! flips back to false. `is_token_revoked` is fail-closed by contract —
//! a token that was never issued, a revoked token, and an expired token
//! all read as revoked, so callers cannot distinguish "unknown" from
//! "revoked" and accidentally trust either.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::models::{NewRefreshToken, RefreshToken};

/// Persistence port for refresh-token sessions
#[async_trait]
pub trait RefreshTokenRepository: Send + Sync {
    /// Exact-match lookup by raw token string; no side effects
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>>;

    /// Insert a new session record
    async fn create(&self, new_token: &NewRefreshToken) -> Result<RefreshToken>;

    /// Revoke all currently-active tokens for a user ("log out everywhere").
    /// Returns whether any row changed.
    async fn revoke_by_user_id(&self, user_id: Uuid) -> Result<bool>;

    /// Revoke one token. Idempotent: revoking an already-revoked or unknown
    /// token returns false, never an error.
    async fn revoke_by_token(&self, token: &str) -> Result<bool>;

    /// Fail-closed validity check: true for unknown, revoked, and expired
    /// tokens alike. False only for an issued, active, unexpired token.
    async fn is_token_revoked(&self, token: &str) -> Result<bool>;
}

fn refresh_token_from_row(row: &sqlx::postgres::PgRow) -> RefreshToken {
    RefreshToken {
        id: row.get("id"),
        token: row.get("token"),
        user_id: row.get("user_id"),
        expires_at: row.get("expires_at"),
        revoked: row.get("revoked"),
        created_at: row.get("created_at"),
    }
}

/// PostgreSQL adapter for the refresh-token port
#[derive(Clone)]
pub struct PgRefreshTokenRepository {
    pool: PgPool,
}

impl PgRefreshTokenRepository {
    /// Create a new refresh token repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenRepository for PgRefreshTokenRepository {
    async fn find_by_token(&self, token: &str) -> Result<Option<RefreshToken>> {
        let row = sqlx::query(
            r#"
            SELECT id, token, user_id, expires_at, revoked, created_at
            FROM refresh_tokens
            WHERE token = $1
            "#,
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| refresh_token_from_row(&row)))
    }

    async fn create(&self, new_token: &NewRefreshToken) -> Result<RefreshToken> {
        info!("Creating refresh token for user: {}", new_token.user_id);

        let row = sqlx::query(
            r#"
            INSERT INTO refresh_tokens (token, user_id, expires_at, revoked)
            VALUES ($1, $2, $3, $4)
            RETURNING id, token, user_id, expires_at, revoked, created_at
            "#,
        )
        .bind(&new_token.token)
        .bind(new_token.user_id)
        .bind(new_token.expires_at)
        .bind(new_token.revoked)
        .fetch_one(&self.pool)
        .await?;

        Ok(refresh_token_from_row(&row))
    }

    async fn revoke_by_user_id(&self, user_id: Uuid) -> Result<bool> {
        info!("Revoking all refresh tokens for user: {}", user_id);

        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE user_id = $1 AND NOT revoked
            "#,
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn revoke_by_token(&self, token: &str) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE token = $1 AND NOT revoked
            "#,
        )
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn is_token_revoked(&self, token: &str) -> Result<bool> {
        match self.find_by_token(token).await? {
            Some(stored) => Ok(!stored.is_active()),
            None => Ok(true),
        }
    }
}
