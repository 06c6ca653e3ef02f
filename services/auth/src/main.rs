use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod middleware;
mod models;
mod rate_limiter;
mod repositories;
mod routes;
mod token;
mod validation;

use constru_common::database::{DatabaseConfig, health_check, init_pool};
use sqlx::PgPool;

use crate::{
    rate_limiter::{RateLimiter, RateLimiterConfig},
    repositories::{PgRefreshTokenRepository, RefreshTokenRepository, UserRepository},
    token::{TokenConfig, TokenService},
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub token_service: TokenService,
    pub user_repository: UserRepository,
    pub refresh_tokens: Arc<dyn RefreshTokenRepository>,
    pub rate_limiter: RateLimiter,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending schema migrations
    sqlx::migrate!("../../migrations").run(&pool).await?;

    // Initialize token service
    let token_config = TokenConfig::from_env()?;
    let token_service = TokenService::new(token_config)?;

    let user_repository = UserRepository::new(pool.clone());
    let refresh_tokens: Arc<dyn RefreshTokenRepository> =
        Arc::new(PgRefreshTokenRepository::new(pool.clone()));
    let rate_limiter = RateLimiter::new(RateLimiterConfig::default());

    let app_state = AppState {
        db_pool: pool,
        token_service,
        user_repository,
        refresh_tokens,
        rate_limiter,
    };

    info!("Authentication service initialized successfully");

    // Start the web server
    let app = routes::create_router(app_state);

    let addr =
        std::env::var("AUTH_SERVICE_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Authentication service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
