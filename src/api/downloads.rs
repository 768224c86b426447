//! Download shelf API endpoints.

use axum::{
    extract::{Path, State},
    response::Response,
};

use super::{attachment, success, ApiResult};
use crate::errors::AppError;
use crate::AppState;

/// GET /api/downloads - List files waiting to be downloaded.
pub async fn list_downloads(State(state): State<AppState>) -> ApiResult<Vec<String>> {
    success(state.downloads.list().await?)
}

/// GET /api/downloads/{name} - Download one file and remove it from the shelf.
pub async fn get_download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Response, AppError> {
    let content = state.downloads.take(&name).await?;
    Ok(attachment(&name, content))
}

/// DELETE /api/downloads/{name} - Drop a file from the shelf.
pub async fn delete_download(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> ApiResult<()> {
    state.downloads.remove(&name).await?;
    success(())
}
