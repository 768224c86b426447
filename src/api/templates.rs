//! Template API endpoints.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    response::Response,
};
use serde::Deserialize;

use super::{attachment, success, ApiResult};
use crate::errors::AppError;
use crate::models::{TemplateInfo, TemplateKind};
use crate::AppState;

/// Largest accepted template upload. Workbooks with embedded images run well past
/// the framework's 2 MB default.
pub const TEMPLATE_BODY_LIMIT: usize = 64 * 1024 * 1024;

/// Query parameters for a template upload.
#[derive(Debug, Deserialize)]
pub struct TemplateUploadParams {
    pub name: Option<String>,
}

fn parse_kind(kind: &str) -> Result<TemplateKind, AppError> {
    TemplateKind::parse(kind)
        .ok_or_else(|| AppError::BadRequest(format!("Unknown template kind '{}'", kind)))
}

fn default_display_name(kind: TemplateKind) -> String {
    match kind {
        TemplateKind::Test => format!("{}.docx", kind.code()),
        _ => format!("{}.xlsx", kind.code()),
    }
}

/// GET /api/templates - List registered templates.
pub async fn list_templates(State(state): State<AppState>) -> ApiResult<Vec<TemplateInfo>> {
    success(state.templates.list_templates().await?)
}

/// GET /api/templates/{kind} - Download a template.
pub async fn get_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> Result<Response, AppError> {
    let record = state.templates.get_record(parse_kind(&kind)?).await?;
    Ok(attachment(&record.info.display_name, record.binary_content))
}

/// PUT /api/templates/{kind} - Upload a template, replacing the current one.
pub async fn put_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
    Query(params): Query<TemplateUploadParams>,
    body: Bytes,
) -> ApiResult<TemplateInfo> {
    let kind = parse_kind(&kind)?;
    if body.is_empty() {
        return Err(AppError::Validation("Template content is empty".to_string()));
    }

    let name = params
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| default_display_name(kind));
    success(state.templates.save_template(kind, &body, &name).await?)
}

/// DELETE /api/templates/{kind} - Remove a template.
pub async fn delete_template(
    State(state): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<()> {
    state.templates.delete_template(parse_kind(&kind)?).await?;
    success(())
}
