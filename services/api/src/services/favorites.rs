//! Favorite use cases: toggling and listing template favorites

use futures::future;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::Template;
use crate::repositories::{FavoriteRepository, TemplateRepository};

/// Result of a favorite toggle
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ToggleOutcome {
    pub is_favorite: bool,
}

/// Use cases around template favorites
#[derive(Clone)]
pub struct FavoriteService {
    templates: Arc<dyn TemplateRepository>,
    favorites: Arc<dyn FavoriteRepository>,
}

impl FavoriteService {
    /// Create a new favorite service
    pub fn new(
        templates: Arc<dyn TemplateRepository>,
        favorites: Arc<dyn FavoriteRepository>,
    ) -> Self {
        Self {
            templates,
            favorites,
        }
    }

    /// Toggle a favorite. This is a toggle, not a set operation: callers
    /// cannot force a target state. The template must exist before any
    /// write happens.
    pub async fn toggle(&self, user_id: Uuid, template_id: Uuid) -> ApiResult<ToggleOutcome> {
        self.templates
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

        let is_favorite = self.favorites.toggle(user_id, template_id).await?;

        info!(
            "Toggled favorite {} for user {}: now {}",
            template_id, user_id, is_favorite
        );

        Ok(ToggleOutcome { is_favorite })
    }

    /// List the user's favorite templates. Favorite ids are resolved
    /// concurrently; ids whose template has since been deleted are dropped
    /// from the result rather than repaired or reported.
    pub async fn list_favorites(&self, user_id: Uuid) -> ApiResult<Vec<Template>> {
        let ids = self.favorites.find_by_user_id(user_id).await?;

        let lookups = ids.iter().map(|id| self.templates.find_by_id(*id));
        let resolved = future::join_all(lookups).await;

        let mut templates = Vec::with_capacity(resolved.len());
        for result in resolved {
            if let Some(template) = result? {
                templates.push(template);
            }
        }

        Ok(templates)
    }

    /// Count how many users favorited a template
    pub async fn favorite_count(&self, template_id: Uuid) -> ApiResult<i64> {
        self.templates
            .find_by_id(template_id)
            .await?
            .ok_or_else(|| ApiError::NotFound("Template not found".to_string()))?;

        Ok(self.favorites.favorite_count(template_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use async_trait::async_trait;
    use chrono::Utc;
    use std::collections::HashMap;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryTemplateRepository {
        templates: Mutex<HashMap<Uuid, Template>>,
    }

    impl MemoryTemplateRepository {
        async fn insert(&self, template: Template) {
            self.templates.lock().await.insert(template.id, template);
        }

        async fn delete(&self, id: Uuid) {
            self.templates.lock().await.remove(&id);
        }
    }

    #[async_trait]
    impl TemplateRepository for MemoryTemplateRepository {
        async fn find_by_id(&self, id: Uuid) -> Result<Option<Template>> {
            Ok(self.templates.lock().await.get(&id).cloned())
        }

        async fn list(&self) -> Result<Vec<Template>> {
            Ok(self.templates.lock().await.values().cloned().collect())
        }
    }

    #[derive(Default)]
    struct MemoryFavoriteRepository {
        pairs: Mutex<Vec<(Uuid, Uuid)>>,
    }

    #[async_trait]
    impl FavoriteRepository for MemoryFavoriteRepository {
        async fn find_by_user_id(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
            Ok(self
                .pairs
                .lock()
                .await
                .iter()
                .filter(|(user, _)| *user == user_id)
                .map(|(_, template)| *template)
                .collect())
        }

        async fn add_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()> {
            let mut pairs = self.pairs.lock().await;
            if !pairs.contains(&(user_id, template_id)) {
                pairs.push((user_id, template_id));
            }
            Ok(())
        }

        async fn remove_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<()> {
            self.pairs
                .lock()
                .await
                .retain(|pair| *pair != (user_id, template_id));
            Ok(())
        }

        async fn is_favorite(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
            Ok(self.pairs.lock().await.contains(&(user_id, template_id)))
        }

        async fn favorite_count(&self, template_id: Uuid) -> Result<i64> {
            Ok(self
                .pairs
                .lock()
                .await
                .iter()
                .filter(|(_, template)| *template == template_id)
                .count() as i64)
        }

        async fn toggle(&self, user_id: Uuid, template_id: Uuid) -> Result<bool> {
            let mut pairs = self.pairs.lock().await;
            if pairs.contains(&(user_id, template_id)) {
                pairs.retain(|pair| *pair != (user_id, template_id));
                Ok(false)
            } else {
                pairs.push((user_id, template_id));
                Ok(true)
            }
        }
    }

    fn template(name: &str) -> Template {
        Template {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            category: "structural".to_string(),
            project_type: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service_with(
        templates: Arc<MemoryTemplateRepository>,
        favorites: Arc<MemoryFavoriteRepository>,
    ) -> FavoriteService {
        FavoriteService::new(templates, favorites)
    }

    #[tokio::test]
    async fn toggle_twice_returns_to_original_state() {
        let templates = Arc::new(MemoryTemplateRepository::default());
        let favorites = Arc::new(MemoryFavoriteRepository::default());
        let concrete = template("concrete slab");
        templates.insert(concrete.clone()).await;

        let service = service_with(templates, favorites);
        let user = Uuid::new_v4();

        let first = service.toggle(user, concrete.id).await.unwrap();
        assert!(first.is_favorite);

        let second = service.toggle(user, concrete.id).await.unwrap();
        assert!(!second.is_favorite);
    }

    #[tokio::test]
    async fn toggling_missing_template_fails_without_writing() {
        let templates = Arc::new(MemoryTemplateRepository::default());
        let favorites = Arc::new(MemoryFavoriteRepository::default());
        let service = service_with(templates, favorites.clone());

        let result = service.toggle(Uuid::new_v4(), Uuid::new_v4()).await;

        assert!(matches!(result, Err(ApiError::NotFound(_))));
        assert!(favorites.pairs.lock().await.is_empty());
    }

    #[tokio::test]
    async fn listing_silently_drops_deleted_templates() {
        let templates = Arc::new(MemoryTemplateRepository::default());
        let favorites = Arc::new(MemoryFavoriteRepository::default());
        let kept = template("brick wall");
        let deleted = template("roof truss");
        templates.insert(kept.clone()).await;
        templates.insert(deleted.clone()).await;

        let service = service_with(templates.clone(), favorites);
        let user = Uuid::new_v4();

        service.toggle(user, kept.id).await.unwrap();
        service.toggle(user, deleted.id).await.unwrap();

        // The template disappears after being favorited.
        templates.delete(deleted.id).await;

        let listed = service.list_favorites(user).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[tokio::test]
    async fn favorite_lifecycle_counts_across_users() {
        let favorites = MemoryFavoriteRepository::default();
        let user = Uuid::new_v4();
        let template_id = Uuid::new_v4();

        favorites.add_favorite(user, template_id).await.unwrap();
        assert!(favorites.is_favorite(user, template_id).await.unwrap());
        assert_eq!(favorites.favorite_count(template_id).await.unwrap(), 1);

        // Re-adding the same pair does not create a duplicate.
        favorites.add_favorite(user, template_id).await.unwrap();
        assert_eq!(favorites.favorite_count(template_id).await.unwrap(), 1);

        favorites.remove_favorite(user, template_id).await.unwrap();
        assert_eq!(favorites.favorite_count(template_id).await.unwrap(), 0);

        // Removing an absent pair is a no-op, not an error.
        favorites.remove_favorite(user, template_id).await.unwrap();
    }

    #[tokio::test]
    async fn favorite_count_requires_existing_template() {
        let templates = Arc::new(MemoryTemplateRepository::default());
        let favorites = Arc::new(MemoryFavoriteRepository::default());
        let service = service_with(templates, favorites);

        let result = service.favorite_count(Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
