//! Recommendation repository for database operations
//!
//! Besides plain row access this adapter owns the two derived views: the
//! behavior-pattern aggregation over the raw activity feed and the
//! favorites-overlap similarity ranking.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::RecommendationRepository;
use crate::models::{
    BehaviorPattern, InteractionType, ItemCount, RecommendationStatus, RecommendationType,
    SimilarUser, TermCount, UserRecommendation,
};

const RECOMMENDATION_COLUMNS: &str = r#"
    id, user_id, rec_type, material_id, category_id, project_type,
    supplier_id, score, reason, status, expires_at, created_at, updated_at
"#;

fn recommendation_from_row(row: &sqlx::postgres::PgRow) -> Result<UserRecommendation> {
    let rec_type: String = row.get("rec_type");
    let status: String = row.get("status");

    Ok(UserRecommendation {
        id: row.get("id"),
        user_id: row.get("user_id"),
        rec_type: rec_type
            .parse::<RecommendationType>()
            .map_err(|e| anyhow::anyhow!(e))?,
        material_id: row.get("material_id"),
        category_id: row.get("category_id"),
        project_type: row.get("project_type"),
        supplier_id: row.get("supplier_id"),
        score: row.get("score"),
        reason: row.get("reason"),
        status: status
            .parse::<RecommendationStatus>()
            .map_err(|e| anyhow::anyhow!(e))?,
        expires_at: row.get("expires_at"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// PostgreSQL adapter for the recommendation port
#[derive(Clone)]
pub struct PgRecommendationRepository {
    pool: PgPool,
}

impl PgRecommendationRepository {
    /// Create a new recommendation repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecommendationRepository for PgRecommendationRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<UserRecommendation>> {
        let row = sqlx::query(&format!(
            "SELECT {RECOMMENDATION_COLUMNS} FROM user_recommendations WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| recommendation_from_row(&row)).transpose()
    }

    async fn find_for_user(
        &self,
        user_id: Uuid,
        status: Option<RecommendationStatus>,
        limit: u32,
    ) -> Result<Vec<UserRecommendation>> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RECOMMENDATION_COLUMNS}
            FROM user_recommendations
            WHERE user_id = $1
              AND ($2::text IS NULL OR status = $2)
              AND (expires_at IS NULL OR expires_at > now())
            ORDER BY score DESC
            LIMIT $3
            "#
        ))
        .bind(user_id)
        .bind(status.map(|s| s.as_str().to_string()))
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(recommendation_from_row).collect()
    }

    async fn update_status_from(
        &self,
        id: Uuid,
        from: RecommendationStatus,
        to: RecommendationStatus,
    ) -> Result<Option<UserRecommendation>> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE user_recommendations
            SET status = $3, updated_at = now()
            WHERE id = $1 AND status = $2
            RETURNING {RECOMMENDATION_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| recommendation_from_row(&row)).transpose()
    }

    async fn behavior_pattern(&self, user_id: Uuid, window_days: u32) -> Result<BehaviorPattern> {
        let days = i32::try_from(window_days).unwrap_or(i32::MAX);

        let material_rows = sqlx::query(
            r#"
            SELECT material_id AS id, COUNT(*) AS count
            FROM user_events
            WHERE user_id = $1
              AND material_id IS NOT NULL
              AND created_at >= now() - make_interval(days => $2)
            GROUP BY material_id
            ORDER BY count DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        let category_rows = sqlx::query(
            r#"
            SELECT category_id AS id, COUNT(*) AS count
            FROM user_events
            WHERE user_id = $1
              AND category_id IS NOT NULL
              AND created_at >= now() - make_interval(days => $2)
            GROUP BY category_id
            ORDER BY count DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        let search_rows = sqlx::query(
            r#"
            SELECT search_term AS term, COUNT(*) AS count
            FROM user_events
            WHERE user_id = $1
              AND search_term IS NOT NULL
              AND created_at >= now() - make_interval(days => $2)
            GROUP BY search_term
            ORDER BY count DESC
            LIMIT 10
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        let session_row = sqlx::query(
            r#"
            SELECT COUNT(DISTINCT session_id) AS session_count,
                   COALESCE(AVG(duration_secs), 0)::double precision AS average_session_secs
            FROM user_events
            WHERE user_id = $1
              AND session_id IS NOT NULL
              AND created_at >= now() - make_interval(days => $2)
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_one(&self.pool)
        .await?;

        let project_rows = sqlx::query(
            r#"
            SELECT project_type AS term, COUNT(*) AS count
            FROM user_events
            WHERE user_id = $1
              AND project_type IS NOT NULL
              AND created_at >= now() - make_interval(days => $2)
            GROUP BY project_type
            ORDER BY count DESC
            LIMIT 5
            "#,
        )
        .bind(user_id)
        .bind(days)
        .fetch_all(&self.pool)
        .await?;

        let item_counts = |rows: &[sqlx::postgres::PgRow]| {
            rows.iter()
                .map(|row| ItemCount {
                    id: row.get("id"),
                    count: row.get("count"),
                })
                .collect::<Vec<_>>()
        };
        let term_counts = |rows: &[sqlx::postgres::PgRow]| {
            rows.iter()
                .map(|row| TermCount {
                    term: row.get("term"),
                    count: row.get("count"),
                })
                .collect::<Vec<_>>()
        };

        Ok(BehaviorPattern {
            user_id,
            window_days,
            top_materials: item_counts(&material_rows),
            top_categories: item_counts(&category_rows),
            top_search_terms: term_counts(&search_rows),
            session_count: session_row.get("session_count"),
            average_session_secs: session_row.get("average_session_secs"),
            project_type_preferences: term_counts(&project_rows),
        })
    }

    async fn similar_users(&self, user_id: Uuid, limit: u32) -> Result<Vec<SimilarUser>> {
        // Cosine similarity over favorite sets: shared favorites normalized
        // by the geometric mean of both users' favorite counts.
        let rows = sqlx::query(
            r#"
            WITH mine AS (
                SELECT template_id FROM template_favorites WHERE user_id = $1
            ),
            my_count AS (
                SELECT GREATEST(COUNT(*), 1) AS total FROM mine
            ),
            shared AS (
                SELECT tf.user_id, COUNT(*) AS shared_count
                FROM template_favorites tf
                JOIN mine ON mine.template_id = tf.template_id
                WHERE tf.user_id <> $1
                GROUP BY tf.user_id
            ),
            theirs AS (
                SELECT user_id, COUNT(*) AS total
                FROM template_favorites
                WHERE user_id <> $1
                GROUP BY user_id
            )
            SELECT s.user_id,
                   s.shared_count::double precision
                       / (sqrt(mc.total::double precision) * sqrt(t.total::double precision))
                       AS similarity_score
            FROM shared s
            JOIN theirs t ON t.user_id = s.user_id
            CROSS JOIN my_count mc
            ORDER BY similarity_score DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| SimilarUser {
                user_id: row.get("user_id"),
                similarity_score: row.get("similarity_score"),
            })
            .collect())
    }

    async fn log_interaction(
        &self,
        user_id: Uuid,
        recommendation_id: Uuid,
        interaction: InteractionType,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO recommendation_interactions (user_id, recommendation_id, interaction_type)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(user_id)
        .bind(recommendation_id)
        .bind(interaction.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
