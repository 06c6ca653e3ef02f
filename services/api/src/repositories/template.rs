//! Template repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::TemplateRepository;
use crate::models::Template;

fn template_from_row(row: &sqlx::postgres::PgRow) -> Template {
    Template {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        category: row.get("category"),
        project_type: row.get("project_type"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

/// PostgreSQL adapter for the template port
#[derive(Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    /// Create a new template repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, description, category, project_type, created_at, updated_at
            FROM calculation_templates
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| template_from_row(&row)))
    }

    async fn list(&self) -> Result<Vec<Template>> {
        let rows = sqlx::query(
            r#"
            SELECT id, name, description, category, project_type, created_at, updated_at
            FROM calculation_templates
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(template_from_row).collect())
    }
}
