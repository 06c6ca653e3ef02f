//! Application state shared across handlers
//!
//! Everything here is constructed once at startup and injected by value;
//! handlers never reach for globals.

use sqlx::PgPool;
use std::sync::Arc;

use crate::middleware::TokenVerifier;
use crate::repositories::TemplateRepository;
use crate::services::{FavoriteService, RecommendationService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub verifier: TokenVerifier,
    pub templates: Arc<dyn TemplateRepository>,
    pub favorites: FavoriteService,
    pub recommendations: RecommendationService,
}
