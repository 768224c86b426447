//! Category registry. Names are unique case-insensitively; records reference
//! categories by name only, so deleting one never touches requests or history.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::store::{keys, ObjectStoreExt, StoreHandle};

#[derive(Clone)]
pub struct CategoryRegistry {
    store: StoreHandle,
}

impl CategoryRegistry {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// List all categories in creation order.
    pub async fn list(&self) -> Result<Vec<Category>, AppError> {
        Ok(self
            .store
            .get_json(keys::CATEGORIES)
            .await?
            .unwrap_or_default())
    }

    pub async fn get(&self, id: &str) -> Result<Option<Category>, AppError> {
        Ok(self.list().await?.into_iter().find(|c| c.id == id))
    }

    /// Find a category by name, ignoring case and surrounding whitespace.
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, AppError> {
        let categories = self.list().await?;
        Ok(categories.into_iter().find(|c| same_name(&c.name, name)))
    }

    /// Create a new category.
    pub async fn create(&self, request: &CreateCategoryRequest) -> Result<Category, AppError> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Category name is required".to_string()));
        }

        let mut categories = self.list().await?;
        if categories.iter().any(|c| same_name(&c.name, name)) {
            return Err(AppError::Conflict(format!(
                "Category '{}' already exists",
                name
            )));
        }

        let category = Category {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.to_string(),
            description: request.description.clone(),
            color: request.color.clone(),
            created_at: Utc::now().to_rfc3339(),
        };
        categories.push(category.clone());
        self.store.set_json(keys::CATEGORIES, &categories).await?;

        tracing::info!("Created category '{}'", category.name);
        Ok(category)
    }

    /// Return the category named `name`, creating it if needed.
    pub async fn ensure(&self, name: &str) -> Result<Category, AppError> {
        if let Some(existing) = self.find_by_name(name).await? {
            return Ok(existing);
        }
        self.create(&CreateCategoryRequest {
            name: name.to_string(),
            description: None,
            color: None,
        })
        .await
    }

    /// Update a category. Unset fields keep their current value.
    pub async fn update(
        &self,
        id: &str,
        request: &UpdateCategoryRequest,
    ) -> Result<Category, AppError> {
        let mut categories = self.list().await?;
        let index = categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| AppError::NotFound(format!("Category {} not found", id)))?;

        if let Some(name) = &request.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AppError::Validation("Category name is required".to_string()));
            }
            if categories
                .iter()
                .any(|c| c.id != id && same_name(&c.name, name))
            {
                return Err(AppError::Conflict(format!(
                    "Category '{}' already exists",
                    name
                )));
            }
            categories[index].name = name.to_string();
        }
        if request.description.is_some() {
            categories[index].description = request.description.clone();
        }
        if request.color.is_some() {
            categories[index].color = request.color.clone();
        }

        let updated = categories[index].clone();
        self.store.set_json(keys::CATEGORIES, &categories).await?;
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let mut categories = self.list().await?;
        let before = categories.len();
        categories.retain(|c| c.id != id);
        if categories.len() == before {
            return Err(AppError::NotFound(format!("Category {} not found", id)));
        }
        self.store.set_json(keys::CATEGORIES, &categories).await
    }
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryObjectStore;
    use std::sync::Arc;

    fn registry() -> CategoryRegistry {
        CategoryRegistry::new(Arc::new(MemoryObjectStore::new("test")))
    }

    fn create_request(name: &str) -> CreateCategoryRequest {
        CreateCategoryRequest {
            name: name.to_string(),
            description: None,
            color: Some("#3b82f6".to_string()),
        }
    }

    #[tokio::test]
    async fn test_create_and_list_in_creation_order() {
        let registry = registry();
        registry.create(&create_request("Sprint-5")).await.unwrap();
        registry.create(&create_request("Hotfixes")).await.unwrap();

        let names: Vec<_> = registry
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Sprint-5", "Hotfixes"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_case_insensitive() {
        let registry = registry();
        registry.create(&create_request("Sprint-5")).await.unwrap();

        let err = registry.create(&create_request("sprint-5")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_ensure_reuses_existing() {
        let registry = registry();
        let created = registry.create(&create_request("Sprint-5")).await.unwrap();

        let ensured = registry.ensure("SPRINT-5").await.unwrap();
        assert_eq!(ensured.id, created.id);

        let fresh = registry.ensure("Sprint-6").await.unwrap();
        assert_eq!(fresh.name, "Sprint-6");
        assert_eq!(registry.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let registry = registry();
        let a = registry.create(&create_request("Alpha")).await.unwrap();
        registry.create(&create_request("Beta")).await.unwrap();

        let renamed = registry
            .update(
                &a.id,
                &UpdateCategoryRequest {
                    name: Some("Gamma".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Gamma");
        assert_eq!(renamed.color.as_deref(), Some("#3b82f6"));

        let err = registry
            .update(
                &a.id,
                &UpdateCategoryRequest {
                    name: Some("beta".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        registry.delete(&a.id).await.unwrap();
        assert!(registry.get(&a.id).await.unwrap().is_none());
        assert!(matches!(
            registry.delete(&a.id).await,
            Err(AppError::NotFound(_))
        ));
    }
}
