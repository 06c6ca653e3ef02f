//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info};
use uuid::Uuid;

use crate::{
    AppState,
    middleware::auth_middleware,
    models::{LoginCredentials, NewRefreshToken, NewUser},
    validation::{validate_email, validate_password, validate_username},
};

/// Response for token issuance (login and refresh)
#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Request carrying a refresh token (refresh and logout)
#[derive(Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/auth/logout-all", post(logout_all))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh_token))
        .route("/auth/logout", post(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// User registration endpoint
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<NewUser>,
) -> Result<impl IntoResponse, AuthError> {
    validate_username(&payload.username).map_err(AuthError::Validation)?;
    validate_email(&payload.email).map_err(AuthError::Validation)?;
    validate_password(&payload.password).map_err(AuthError::Validation)?;

    let user = state.user_repository.create(&payload).await.map_err(|e| {
        if is_unique_violation(&e) {
            AuthError::Validation("Username or email already in use".to_string())
        } else {
            error!("Failed to create user: {}", e);
            AuthError::InternalServerError
        }
    })?;

    info!("Registered user: {}", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({"success": true, "data": user})),
    ))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<impl IntoResponse, AuthError> {
    if !state.rate_limiter.is_allowed(&payload.username_or_email).await {
        return Err(AuthError::RateLimited);
    }

    let user = state
        .user_repository
        .find_by_username_or_email(&payload.username_or_email)
        .await
        .map_err(|e| {
            error!("Failed to look up user: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    let password_ok = state
        .user_repository
        .verify_password(&user, &payload.password)
        .await
        .map_err(|e| {
            error!("Failed to verify password: {}", e);
            AuthError::InternalServerError
        })?;

    if !password_ok {
        return Err(AuthError::Unauthorized);
    }

    let response = issue_tokens(&state, &user).await?;

    info!("Login successful for user: {}", user.id);

    Ok((StatusCode::OK, Json(json!({"success": true, "data": response}))))
}

/// Refresh token endpoint: exchanges an active refresh token for a fresh
/// access token, rotating the refresh token in the process
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    // Fail closed: unknown, revoked, and expired tokens are all rejected
    // through the same check.
    let revoked = state
        .refresh_tokens
        .is_token_revoked(&payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to check refresh token state: {}", e);
            AuthError::InternalServerError
        })?;

    if revoked {
        return Err(AuthError::Unauthorized);
    }

    let stored = state
        .refresh_tokens
        .find_by_token(&payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to load refresh token: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    let user = state
        .user_repository
        .find_by_id(stored.user_id)
        .await
        .map_err(|e| {
            error!("Failed to load user for refresh: {}", e);
            AuthError::InternalServerError
        })?
        .ok_or(AuthError::Unauthorized)?;

    // Rotate: the old token is revoked (never deleted) before the
    // replacement is persisted.
    state
        .refresh_tokens
        .revoke_by_token(&payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to revoke old refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    let response = issue_tokens(&state, &user).await?;

    info!("Rotated refresh token for user: {}", user.id);

    Ok((StatusCode::OK, Json(json!({"success": true, "data": response}))))
}

/// Logout endpoint: revokes the presented refresh token. Idempotent —
/// revoking an unknown or already-revoked token still answers 200.
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<RefreshTokenRequest>,
) -> Result<impl IntoResponse, AuthError> {
    state
        .refresh_tokens
        .revoke_by_token(&payload.refresh_token)
        .await
        .map_err(|e| {
            error!("Failed to revoke refresh token: {}", e);
            AuthError::InternalServerError
        })?;

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "message": "Logged out successfully"})),
    ))
}

/// Logout-everywhere endpoint: revokes every active session of the
/// authenticated user
pub async fn logout_all(
    State(state): State<AppState>,
    Extension(user_id): Extension<Uuid>,
) -> Result<impl IntoResponse, AuthError> {
    let revoked = state
        .refresh_tokens
        .revoke_by_user_id(user_id)
        .await
        .map_err(|e| {
            error!("Failed to revoke user sessions: {}", e);
            AuthError::InternalServerError
        })?;

    Ok((
        StatusCode::OK,
        Json(json!({"success": true, "data": {"revoked": revoked}})),
    ))
}

/// Issue a new access token and a new persisted refresh token for a user
async fn issue_tokens(
    state: &AppState,
    user: &crate::models::User,
) -> Result<TokenResponse, AuthError> {
    let access_token = state.token_service.generate_access_token(user).map_err(|e| {
        error!("Failed to generate access token: {}", e);
        AuthError::InternalServerError
    })?;

    let refresh_token = state.token_service.mint_refresh_token();
    let new_token = NewRefreshToken::new(
        refresh_token.clone(),
        user.id,
        state.token_service.refresh_token_expires_at(),
    );

    state.refresh_tokens.create(&new_token).await.map_err(|e| {
        error!("Failed to persist refresh token: {}", e);
        AuthError::InternalServerError
    })?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: state.token_service.access_token_expiry(),
    })
}

/// Check whether a repository error is a unique-constraint violation
fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<sqlx::Error>(),
        Some(sqlx::Error::Database(db)) if db.is_unique_violation()
    )
}

/// Custom error type for authentication errors
#[derive(Debug)]
pub enum AuthError {
    Validation(String),
    Unauthorized,
    RateLimited,
    InternalServerError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AuthError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
            }
            AuthError::RateLimited => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many attempts, try again later".to_string(),
            ),
            AuthError::InternalServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            ),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}
