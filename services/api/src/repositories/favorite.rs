//! Favorite repository for database operations
//!
//! The (user_id, template_id) pair is the primary key, so uniqueness is
//! structural and `add_favorite` can absorb duplicates with
//! `ON CONFLICT DO NOTHING`.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use super::FavoriteRepository;

/// PostgreSQL adapter for the favorite port
#[derive(Clone)]
pub struct PgFavoriteRepository {
    pool: PgPool,
}

impl PgFavoriteRepository {
    /// Create a new favorite repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FavoriteRepository for PgFavoriteRepository {
    async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            r#"
            SELECT template_id
            FROM template_favorites
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(|row| row.get("template_id")).collect())
    }

    async fn add_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO template_favorites (user_id, template_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn remove_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()> {
        sqlx::query(
            r#"
            DELETE FROM template_favorites
            WHERE user_id = $1 AND template_id = $2
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn is_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            r#"
            SELECT 1 AS present
            FROM template_favorites
            WHERE user_id = $1 AND template_id = $2
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.is_some())
    }

    async fn favorite_count(&self, template_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM template_favorites
            WHERE template_id = $1
            "#,
        )
        .bind(template_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn toggle(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
        // Delete-if-exists first; each statement is atomic on its own, so a
        // concurrent toggle can never act on a stale read.
        let deleted = sqlx::query(
            r#"
            DELETE FROM template_favorites
            WHERE user_id = $1 AND template_id = $2
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .execute(&self.pool)
        .await?;

        if deleted.rows_affected() > 0 {
            info!("Removed favorite {} for user {}", template_id, user_id);
            return Ok(false);
        }

        // Nothing to delete: insert. A racing insert that wins the conflict
        // leaves the pair favorited, which matches what we report.
        sqlx::query(
            r#"
            INSERT INTO template_favorites (user_id, template_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(template_id)
        .execute(&self.pool)
        .await?;

        info!("Added favorite {} for user {}", template_id, user_id);
        Ok(true)
    }
}
