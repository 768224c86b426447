//! History API endpoints.

use axum::{
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use super::{attachment, success, ApiResult};
use crate::errors::AppError;
use crate::models::HistoryEntry;
use crate::AppState;

/// Query parameters for listing history.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// Substring matched against case id and creation date
    #[serde(default)]
    pub q: String,
}

/// GET /api/history?q= - List history entries, most recent first.
pub async fn list_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Vec<HistoryEntry>> {
    success(state.history.search(&query.q).await?)
}

/// DELETE /api/history/{id} - Remove one entry.
pub async fn delete_history_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<()> {
    state.history.remove(&id).await?;
    success(())
}

/// DELETE /api/history - Remove every entry.
pub async fn clear_history(State(state): State<AppState>) -> ApiResult<()> {
    state.history.clear().await?;
    tracing::info!("History cleared");
    success(())
}

/// GET /api/history/export - Download the history as CSV.
pub async fn export_history(State(state): State<AppState>) -> Result<Response, AppError> {
    let csv = state.history.export_csv().await?;
    let file_name = format!(
        "historial-fr-{}.csv",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    Ok(attachment(&file_name, csv))
}
