//! Recommendation use cases: listing, status transitions, behavior
//! patterns, similar users, and the interaction audit log

use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use constru_common::cache::RedisPool;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    BehaviorPattern, InteractionType, RecommendationStatus, SimilarUser, UserRecommendation,
};
use crate::repositories::RecommendationRepository;

/// Fixed default analysis window, so results are reproducible
pub const DEFAULT_BEHAVIOR_WINDOW_DAYS: u32 = 30;
const MAX_BEHAVIOR_WINDOW_DAYS: u32 = 365;

const DEFAULT_RECOMMENDATION_LIMIT: u32 = 20;
const MAX_RECOMMENDATION_LIMIT: u32 = 100;

const DEFAULT_SIMILAR_USERS_LIMIT: u32 = 10;
const MAX_SIMILAR_USERS_LIMIT: u32 = 50;

const BEHAVIOR_PATTERN_CACHE_TTL_SECS: u64 = 300;

/// Use cases around user recommendations
#[derive(Clone)]
pub struct RecommendationService {
    recommendations: Arc<dyn RecommendationRepository>,
    cache: Option<RedisPool>,
}

impl RecommendationService {
    /// Create a new recommendation service. The cache is optional; without
    /// it every behavior-pattern request recomputes the aggregate.
    pub fn new(
        recommendations: Arc<dyn RecommendationRepository>,
        cache: Option<RedisPool>,
    ) -> Self {
        Self {
            recommendations,
            cache,
        }
    }

    /// Compute (or fetch from cache) the user's behavior pattern
    pub async fn behavior_pattern(
        &self,
        user_id: Uuid,
        window_days: Option<u32>,
    ) -> ApiResult<BehaviorPattern> {
        let window = window_days
            .unwrap_or(DEFAULT_BEHAVIOR_WINDOW_DAYS)
            .clamp(1, MAX_BEHAVIOR_WINDOW_DAYS);

        let cache_key = format!("behavior_pattern:{}:{}", user_id, window);

        if let Some(cache) = &self.cache {
            match cache.get(&cache_key).await {
                Ok(Some(cached)) => {
                    if let Ok(pattern) = serde_json::from_str::<BehaviorPattern>(&cached) {
                        return Ok(pattern);
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Behavior pattern cache read failed: {}", e),
            }
        }

        let pattern = self
            .recommendations
            .behavior_pattern(user_id, window)
            .await?;

        if let Some(cache) = &self.cache {
            match serde_json::to_string(&pattern) {
                Ok(serialized) => {
                    if let Err(e) = cache
                        .set(&cache_key, &serialized, Some(BEHAVIOR_PATTERN_CACHE_TTL_SECS))
                        .await
                    {
                        warn!("Behavior pattern cache write failed: {}", e);
                    }
                }
                Err(e) => warn!("Behavior pattern serialization failed: {}", e),
            }
        }

        Ok(pattern)
    }

    /// List the user's unexpired recommendations, optionally filtered by
    /// status, highest score first
    pub async fn recommendations(
        &self,
        user_id: Uuid,
        status: Option<RecommendationStatus>,
        limit: Option<u32>,
    ) -> ApiResult<Vec<UserRecommendation>> {
        let limit = limit
            .unwrap_or(DEFAULT_RECOMMENDATION_LIMIT)
            .clamp(1, MAX_RECOMMENDATION_LIMIT);

        Ok(self
            .recommendations
            .find_for_user(user_id, status, limit)
            .await?)
    }

    /// Move a recommendation through its lifecycle. Transitions outside the
    /// table are rejected; the write itself is compare-and-swap guarded so a
    /// concurrent writer cannot be silently overwritten.
    pub async fn update_status(
        &self,
        recommendation_id: Uuid,
        target: RecommendationStatus,
    ) -> ApiResult<UserRecommendation> {
        let current = self
            .recommendations
            .find_by_id(recommendation_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Recommendation not found".to_string()))?;

        if !current.status.can_transition_to(target) {
            return Err(ApiError::BadRequest(format!(
                "Cannot move a {} recommendation to {}",
                current.status, target
            )));
        }

        match self
            .recommendations
            .update_status_from(recommendation_id, current.status, target)
            .await?
        {
            Some(updated) => {
                info!(
                    "Recommendation {} moved {} -> {}",
                    recommendation_id, current.status, target
                );
                Ok(updated)
            }
            None => Err(ApiError::Conflict(
                "Recommendation was modified concurrently".to_string(),
            )),
        }
    }

    /// Rank other users by favorites overlap
    pub async fn similar_users(
        &self,
        user_id: Uuid,
        limit: Option<u32>,
    ) -> ApiResult<Vec<SimilarUser>> {
        let limit = limit
            .unwrap_or(DEFAULT_SIMILAR_USERS_LIMIT)
            .clamp(1, MAX_SIMILAR_USERS_LIMIT);

        Ok(self.recommendations.similar_users(user_id, limit).await?)
    }

    /// Record how a user interacted with a recommendation. Fire-and-forget:
    /// a failed audit write is logged, never surfaced to the caller.
    pub async fn log_interaction(
        &self,
        user_id: Uuid,
        recommendation_id: Uuid,
        interaction: InteractionType,
    ) {
        if let Err(e) = self
            .recommendations
            .log_interaction(user_id, recommendation_id, interaction)
            .await
        {
            error!(
                "Failed to record {} interaction on recommendation {}: {}",
                interaction.as_str(),
                recommendation_id,
                e
            );
        }
    }
}
