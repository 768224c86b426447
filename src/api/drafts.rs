//! Wizard draft API endpoints.

use axum::{
    extract::{Path, State},
    Json,
};

use super::{success, ApiResult};
use crate::drafts::{DraftItem, DraftList};
use crate::errors::AppError;
use crate::models::RequestRecord;
use crate::AppState;

/// GET /api/draft - Get the draft in progress, if any.
pub async fn get_draft(State(state): State<AppState>) -> ApiResult<Option<RequestRecord>> {
    success(state.drafts.load().await?)
}

/// PUT /api/draft - Replace the draft.
pub async fn save_draft(
    State(state): State<AppState>,
    Json(record): Json<RequestRecord>,
) -> ApiResult<RequestRecord> {
    state.drafts.save(&record).await?;
    success(record)
}

/// DELETE /api/draft - Discard the draft.
pub async fn discard_draft(State(state): State<AppState>) -> ApiResult<()> {
    state.drafts.discard().await?;
    success(())
}

/// POST /api/draft/items - Insert or replace one list item.
pub async fn upsert_draft_item(
    State(state): State<AppState>,
    Json(item): Json<DraftItem>,
) -> ApiResult<RequestRecord> {
    success(state.drafts.upsert_item(item).await?)
}

/// DELETE /api/draft/items/{list}/{id} - Remove one list item.
pub async fn remove_draft_item(
    State(state): State<AppState>,
    Path((list, id)): Path<(String, String)>,
) -> ApiResult<RequestRecord> {
    let list = DraftList::parse(&list)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown draft list '{}'", list)))?;
    success(state.drafts.remove_item(list, &id).await?)
}
