//! Category API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::models::{Category, CreateCategoryRequest, UpdateCategoryRequest};
use crate::AppState;

/// Body for `POST /api/categories/ensure`.
#[derive(Debug, Deserialize)]
pub struct EnsureCategoryRequest {
    pub name: String,
}

/// GET /api/categories - List all categories.
pub async fn list_categories(State(state): State<AppState>) -> ApiResult<Vec<Category>> {
    success(state.categories.list().await?)
}

/// POST /api/categories - Create a new category.
pub async fn create_category(
    State(state): State<AppState>,
    Json(request): Json<CreateCategoryRequest>,
) -> ApiResult<Category> {
    success(state.categories.create(&request).await?)
}

/// POST /api/categories/ensure - Get a category by name, creating it if needed.
pub async fn ensure_category(
    State(state): State<AppState>,
    Json(request): Json<EnsureCategoryRequest>,
) -> ApiResult<Category> {
    success(state.categories.ensure(&request.name).await?)
}

/// PUT /api/categories/{id} - Update a category.
pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<UpdateCategoryRequest>,
) -> ApiResult<Category> {
    success(state.categories.update(&id, &request).await?)
}

/// DELETE /api/categories/{id} - Delete a category.
pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.categories.delete(&id).await?;
    success(())
}
