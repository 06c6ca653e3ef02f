//! Authentication middleware for access-token validation
//!
//! The API service never signs tokens; it verifies the auth service's
//! RS256 signatures with the shared public key, loaded once at startup.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use tracing::error;
use uuid::Uuid;

use crate::{error::ApiError, state::AppState};

/// Access token claims (as issued by the auth service)
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessClaims {
    /// User ID
    pub sub: Uuid,
    /// User role
    pub role: String,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
}

/// Authenticated user information, injected into request extensions
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: String,
}

impl AuthUser {
    /// Reject with 403 unless the user carries the admin role
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == "admin" {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin role required".to_string()))
        }
    }
}

/// Verifier for access tokens, constructed once at startup
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from a PEM-encoded RSA public key
    pub fn new(public_key_pem: &str) -> anyhow::Result<Self> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;
        let mut validation = Validation::new(jsonwebtoken::Algorithm::RS256);
        validation.validate_exp = true;

        Ok(TokenVerifier {
            decoding_key,
            validation,
        })
    }

    /// Build a verifier from the environment
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: Verification key (PEM format) or path to a key file
    pub fn from_env() -> anyhow::Result<Self> {
        let value = std::env::var("JWT_PUBLIC_KEY")
            .map_err(|_| anyhow::anyhow!("JWT_PUBLIC_KEY environment variable not set"))?;

        let pem = if value.starts_with("-----BEGIN") {
            value
        } else {
            std::fs::read_to_string(&value)
                .or_else(|_| {
                    let mut path = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR"));
                    path.push(&value);
                    std::fs::read_to_string(path)
                })
                .map_err(|e| anyhow::anyhow!("Failed to read public key file: {}", e))?
                .trim()
                .to_string()
        };

        Self::new(&pem)
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> anyhow::Result<AccessClaims> {
        let token_data =
            jsonwebtoken::decode::<AccessClaims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }
}

/// Authentication middleware: rejects with 401 before any use case runs
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or(ApiError::Unauthorized)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify(token).map_err(|e| {
        error!("Failed to validate access token: {}", e);
        ApiError::Unauthorized
    })?;

    let user = AuthUser {
        id: claims.sub,
        role: claims.role,
    };

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}
