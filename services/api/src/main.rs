use anyhow::Result;
use std::sync::Arc;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

mod cors;
mod error;
mod middleware;
mod models;
mod repositories;
mod response;
mod routes;
mod services;
mod state;

use constru_common::{
    cache::{RedisConfig, RedisPool},
    database::{DatabaseConfig, health_check, init_pool},
};

use crate::{
    cors::{CorsConfig, build_cors_layer},
    middleware::TokenVerifier,
    repositories::{
        FavoriteRepository, PgFavoriteRepository, PgRecommendationRepository,
        PgTemplateRepository, RecommendationRepository, TemplateRepository,
    },
    services::{FavoriteService, RecommendationService},
    state::AppState,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting API service");

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

    // Initialize Redis connection pool (behavior-pattern cache)
    let redis_config = RedisConfig::from_env()?;
    let redis_pool = RedisPool::new(&redis_config).await?;

    // Access-token verifier (auth service's public key)
    let verifier = TokenVerifier::from_env()?;

    // Wire repositories and services once; handlers receive them via state
    let templates: Arc<dyn TemplateRepository> =
        Arc::new(PgTemplateRepository::new(pool.clone()));
    let favorites: Arc<dyn FavoriteRepository> =
        Arc::new(PgFavoriteRepository::new(pool.clone()));
    let recommendations: Arc<dyn RecommendationRepository> =
        Arc::new(PgRecommendationRepository::new(pool.clone()));

    let favorite_service = FavoriteService::new(templates.clone(), favorites);
    let recommendation_service =
        RecommendationService::new(recommendations, Some(redis_pool));

    let app_state = AppState {
        db_pool: pool,
        verifier,
        templates,
        favorites: favorite_service,
        recommendations: recommendation_service,
    };

    info!("API service initialized successfully");

    // Start the web server
    let cors_config = CorsConfig::from_env()?;
    let app = routes::create_router(app_state).layer(build_cors_layer(&cors_config));

    let addr = std::env::var("API_SERVICE_ADDR").unwrap_or_else(|_| "0.0.0.0:3001".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("API service listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
