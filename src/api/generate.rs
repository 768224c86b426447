//! Generation API endpoint.

use std::path::PathBuf;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use serde::Deserialize;

use super::{success, ApiResult};
use crate::errors::AppError;
use crate::generation::GenerationOutcome;
use crate::models::RequestRecord;
use crate::AppState;

/// Query parameters for a generation run.
#[derive(Debug, Deserialize)]
pub struct GenerateParams {
    /// Destination root overriding the configured one
    pub root: Option<String>,
}

/// POST /api/generate - Generate every file for a request record.
pub async fn generate(
    State(state): State<AppState>,
    Query(params): Query<GenerateParams>,
    record: Result<Json<RequestRecord>, JsonRejection>,
) -> ApiResult<GenerationOutcome> {
    let Json(record) = record.map_err(|rejection| {
        AppError::InvalidRequest(format!("Malformed request record: {}", rejection.body_text()))
    })?;

    let root = match params.root.filter(|r| !r.trim().is_empty()) {
        Some(root) => PathBuf::from(root),
        None => {
            let settings = state.settings.load_or_create().await?;
            if settings.output_folder.trim().is_empty() {
                state.config.resolve_default_output_root()
            } else {
                PathBuf::from(settings.output_folder)
            }
        }
    };

    tracing::debug!("Generating into {:?}", root);
    success(state.generator.generate_all(&record, &root).await?)
}
