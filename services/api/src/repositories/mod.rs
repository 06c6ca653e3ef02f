//! Persistence ports and their PostgreSQL adapters
//!
//! The traits here are the only operations the domain services may perform
//! against storage; handlers and services hold them as trait objects so
//! tests can substitute in-memory implementations.

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::models::{
    BehaviorPattern, InteractionType, RecommendationStatus, SimilarUser, Template,
    UserRecommendation,
};

pub mod favorite;
pub mod recommendation;
pub mod template;

pub use favorite::PgFavoriteRepository;
pub use recommendation::PgRecommendationRepository;
pub use template::PgTemplateRepository;

/// Persistence port for calculation templates
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>>;
    async fn list(&self) -> Result<Vec<Template>>;
}

/// Persistence port for template favorites
#[async_trait]
pub trait FavoriteRepository: Send + Sync {
    /// Favorite template ids for a user; no duplicates by construction
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Uuid>>;

    /// Insert the relation; duplicate pairs are absorbed, not errors
    async fn add_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()>;

    /// Delete the relation if present; no-op when absent
    async fn remove_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()>;

    async fn is_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<bool>;

    /// Count across all users
    async fn favorite_count(&self, template_id: Uuid) -> Result<i64>;

    /// Atomically flip the relation and return the resulting state: true
    /// when the pair is now favorited, false when it was just removed.
    /// Each underlying statement is conditional, so concurrent toggles
    /// cannot interleave a stale read into the write.
    async fn toggle(&self, user_id: Uuid, template_id: Uuid) -> Result<bool>;
}

/// Persistence port for user recommendations and their derived views
#[async_trait]
pub trait RecommendationRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecommendation>>;

    /// Unexpired recommendations for a user, highest score first
    async fn find_for_user(
        &self,
        user_id: Uuid,
        status: Option<RecommendationStatus>,
        limit: u32,
    ) -> Result<Vec<UserRecommendation>>;

    /// Compare-and-swap status write: updates only while the row still has
    /// the expected current status, returning None on a lost race
    async fn update_status_from(
        &self,
        id: Uuid,
        from: RecommendationStatus,
        to: RecommendationStatus,
    ) -> Result<Option<UserRecommendation>>;

    /// Aggregate the user's activity feed over the window
    async fn behavior_pattern(&self, user_id: Uuid, window_days: u32) -> Result<BehaviorPattern>;

    /// Users ranked by favorites overlap with the given user
    async fn similar_users(&self, user_id: Uuid, limit: u32) -> Result<Vec<SimilarUser>>;

    /// Append to the interaction audit log
    async fn log_interaction(
        &self,
        user_id: Uuid,
        recommendation_id: Uuid,
        interaction: InteractionType,
    ) -> Result<()>;
}
