//! Refresh token model and related functionality

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Refresh token entity
///
/// Rows are never deleted: revocation flips `revoked` to true and the flag
/// is monotonic.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RefreshToken {
    pub id: Uuid,
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl RefreshToken {
    /// Check if the token is past its expiry time
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// Check if the token can still be exchanged (not revoked and not expired)
    pub fn is_active(&self) -> bool {
        !self.revoked && !self.is_expired()
    }
}

/// New refresh token creation payload
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked: bool,
}

impl NewRefreshToken {
    /// Create a payload for a fresh, unrevoked token
    pub fn new(token: String, user_id: Uuid, expires_at: DateTime<Utc>) -> Self {
        Self {
            token,
            user_id,
            expires_at,
            revoked: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn token_expiring_in(seconds: i64) -> RefreshToken {
        RefreshToken {
            id: Uuid::new_v4(),
            token: "tok".to_string(),
            user_id: Uuid::new_v4(),
            expires_at: Utc::now() + Duration::seconds(seconds),
            revoked: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn active_token_is_not_expired() {
        let token = token_expiring_in(3600);
        assert!(!token.is_expired());
        assert!(token.is_active());
    }

    #[test]
    fn expired_token_is_inactive() {
        let token = token_expiring_in(-1);
        assert!(token.is_expired());
        assert!(!token.is_active());
    }

    #[test]
    fn revoked_token_is_inactive_even_before_expiry() {
        let mut token = token_expiring_in(3600);
        token.revoked = true;
        assert!(!token.is_active());
    }

    #[test]
    fn new_refresh_token_defaults_to_unrevoked() {
        let new_token =
            NewRefreshToken::new("tok".to_string(), Uuid::new_v4(), Utc::now());
        assert!(!new_token.revoked);
    }
}
