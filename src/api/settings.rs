//! Settings API endpoints.

use axum::{extract::State, response::Response, Json};

use super::{attachment, success, ApiResult};
use crate::errors::AppError;
use crate::models::AppSettings;
use crate::AppState;

/// GET /api/settings - Get the settings, creating defaults on first run.
pub async fn get_settings(State(state): State<AppState>) -> ApiResult<AppSettings> {
    success(state.settings.load_or_create().await?)
}

/// PUT /api/settings - Replace the settings.
pub async fn update_settings(
    State(state): State<AppState>,
    Json(settings): Json<AppSettings>,
) -> ApiResult<AppSettings> {
    if settings.id.trim().is_empty() {
        return Err(AppError::Validation("Settings id is required".to_string()));
    }

    // Template flags follow the template repository, not the client.
    let current = state.settings.load_or_create().await?;
    let settings = AppSettings {
        templates: current.templates,
        created_at: current.created_at,
        ..settings
    };
    success(state.settings.save(settings).await?)
}

/// POST /api/settings/reset - Restore the default settings.
pub async fn reset_settings(State(state): State<AppState>) -> ApiResult<AppSettings> {
    success(state.settings.reset().await?)
}

/// GET /api/settings/export - Download the settings as JSON.
pub async fn export_settings(State(state): State<AppState>) -> Result<Response, AppError> {
    state.settings.load_or_create().await?;
    let json = state.settings.export_json().await?;
    let file_name = format!(
        "fr-generator-config-{}.json",
        chrono::Utc::now().format("%Y-%m-%d")
    );
    Ok(attachment(&file_name, json))
}

/// POST /api/settings/import - Import a previously exported settings document.
pub async fn import_settings(
    State(state): State<AppState>,
    body: String,
) -> ApiResult<AppSettings> {
    match state.settings.import_json(&body).await {
        Ok(settings) => success(settings),
        Err(e) => {
            tracing::warn!("Settings import rejected: {}", e);
            Err(e)
        }
    }
}
