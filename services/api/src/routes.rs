//! API service routes

use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, patch, post},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    error::ApiError,
    middleware::{AuthUser, auth_middleware},
    models::{InteractionType, RecommendationStatus},
    response::ApiResponse,
    state::AppState,
};

/// Query parameters for recommendation listing
#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub status: Option<String>,
    pub limit: Option<u32>,
}

/// Query parameters for behavior-pattern analysis
#[derive(Debug, Deserialize)]
pub struct BehaviorPatternQuery {
    pub days: Option<u32>,
}

/// Query parameters for similar-user lookup
#[derive(Debug, Deserialize)]
pub struct SimilarUsersQuery {
    pub limit: Option<u32>,
}

/// Request for a recommendation status transition
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// Request recording a recommendation interaction
#[derive(Debug, Deserialize)]
pub struct InteractionRequest {
    pub interaction_type: String,
}

/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/templates", get(list_templates))
        .route("/templates/favorites", get(list_favorite_templates))
        .route("/templates/:id", get(get_template))
        .route("/templates/:id/favorite", post(toggle_favorite))
        .route(
            "/admin/templates/:id/favorites/count",
            get(favorite_count),
        )
        .route("/recommendations", get(list_recommendations))
        .route(
            "/recommendations/behavior-pattern",
            get(behavior_pattern),
        )
        .route("/recommendations/similar-users", get(similar_users))
        .route(
            "/recommendations/:id/status",
            patch(update_recommendation_status),
        )
        .route(
            "/recommendations/:id/interactions",
            post(record_interaction),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "api-service"
    }))
}

/// List all calculation templates
pub async fn list_templates(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = state.templates.list().await?;
    Ok(Json(ApiResponse::ok(templates)))
}

/// Get a calculation template by ID
pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let template = state
        .templates
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

    Ok(Json(ApiResponse::ok(template)))
}

/// Toggle a template favorite for the authenticated user
pub async fn toggle_favorite(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let outcome = state.favorites.toggle(user.id, template_id).await?;
    Ok(Json(ApiResponse::ok(outcome)))
}

/// List the authenticated user's favorite templates
pub async fn list_favorite_templates(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> Result<impl IntoResponse, ApiError> {
    let templates = state.favorites.list_favorites(user.id).await?;
    Ok(Json(ApiResponse::ok(templates)))
}

/// Count how many users favorited a template (admin only)
pub async fn favorite_count(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(template_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    user.require_admin()?;

    let count = state.favorites.favorite_count(template_id).await?;
    Ok(Json(ApiResponse::ok(json!({ "count": count }))))
}

/// List the authenticated user's recommendations
pub async fn list_recommendations(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<RecommendationQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<RecommendationStatus>)
        .transpose()
        .map_err(ApiError::BadRequest)?;

    let recommendations = state
        .recommendations
        .recommendations(user.id, status, query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(recommendations)))
}

/// Move a recommendation through its lifecycle
pub async fn update_recommendation_status(
    State(state): State<AppState>,
    Extension(_user): Extension<AuthUser>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let target = payload
        .status
        .parse::<RecommendationStatus>()
        .map_err(ApiError::BadRequest)?;

    let updated = state.recommendations.update_status(id, target).await?;
    Ok(Json(ApiResponse::ok(updated)))
}

/// Get the authenticated user's behavior pattern over a time window
pub async fn behavior_pattern(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<BehaviorPatternQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let pattern = state
        .recommendations
        .behavior_pattern(user.id, query.days)
        .await?;

    Ok(Json(ApiResponse::ok(pattern)))
}

/// Rank other users by favorites overlap with the authenticated user
pub async fn similar_users(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Query(query): Query<SimilarUsersQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let similar = state
        .recommendations
        .similar_users(user.id, query.limit)
        .await?;

    Ok(Json(ApiResponse::ok(similar)))
}

/// Record how the authenticated user interacted with a recommendation
pub async fn record_interaction(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(recommendation_id): Path<Uuid>,
    Json(payload): Json<InteractionRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let interaction = payload
        .interaction_type
        .parse::<InteractionType>()
        .map_err(ApiError::BadRequest)?;

    state
        .recommendations
        .log_interaction(user.id, recommendation_id, interaction)
        .await;

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse::message("Interaction recorded")),
    ))
}
