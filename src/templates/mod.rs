//! Template repository: one active template per kind.
//!
//! Content is stored as raw bytes under the kind's storage key and metadata under
//! `<key>.meta`. The settings flag is updated after the content write; a crash between
//! the two writes can leave the flag stale.

use chrono::Utc;

use crate::errors::AppError;
use crate::models::{TemplateInfo, TemplateKind, TemplateRecord};
use crate::settings::SettingsRepository;
use crate::store::{ObjectStoreExt, StoreHandle};

#[derive(Clone)]
pub struct TemplateRepository {
    store: StoreHandle,
    settings: SettingsRepository,
}

fn meta_key(kind: TemplateKind) -> String {
    format!("{}.meta", kind.storage_key())
}

impl TemplateRepository {
    pub fn new(store: StoreHandle) -> Self {
        let settings = SettingsRepository::new(store.clone());
        Self { store, settings }
    }

    /// Register `content` as the template for `kind`, replacing any previous one.
    pub async fn save_template(
        &self,
        kind: TemplateKind,
        content: &[u8],
        display_name: &str,
    ) -> Result<TemplateInfo, AppError> {
        let info = TemplateInfo {
            kind,
            display_name: display_name.to_string(),
            size: content.len() as u64,
            uploaded_at: Utc::now().to_rfc3339(),
        };

        self.store.set(kind.storage_key(), content).await?;
        self.store.set_json(&meta_key(kind), &info).await?;
        self.settings
            .set_template_flag(kind, Some(display_name.to_string()))
            .await?;

        tracing::info!(
            "Saved {} template '{}' ({} bytes)",
            kind.code(),
            display_name,
            info.size
        );
        Ok(info)
    }

    /// Get the template content for `kind`.
    pub async fn get_template(&self, kind: TemplateKind) -> Result<Vec<u8>, AppError> {
        self.store
            .get(kind.storage_key())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("No {} template registered", kind.code())))
    }

    /// Get the template content and metadata for `kind`.
    pub async fn get_record(&self, kind: TemplateKind) -> Result<TemplateRecord, AppError> {
        let binary_content = self.get_template(kind).await?;
        let info = match self.template_info(kind).await? {
            Some(info) => info,
            None => TemplateInfo {
                kind,
                display_name: kind.code().to_string(),
                size: binary_content.len() as u64,
                uploaded_at: String::new(),
            },
        };
        Ok(TemplateRecord {
            info,
            binary_content,
        })
    }

    pub async fn has_template(&self, kind: TemplateKind) -> Result<bool, AppError> {
        self.store.contains(kind.storage_key()).await
    }

    /// Metadata for `kind`, if a template is registered.
    pub async fn template_info(&self, kind: TemplateKind) -> Result<Option<TemplateInfo>, AppError> {
        if !self.has_template(kind).await? {
            return Ok(None);
        }
        self.store.get_json(&meta_key(kind)).await
    }

    /// Metadata for every registered template.
    pub async fn list_templates(&self) -> Result<Vec<TemplateInfo>, AppError> {
        let mut infos = Vec::new();
        for kind in TemplateKind::ALL {
            if let Some(info) = self.template_info(kind).await? {
                infos.push(info);
            }
        }
        Ok(infos)
    }

    /// Remove the template for `kind`. Removing a missing template is not an error.
    pub async fn delete_template(&self, kind: TemplateKind) -> Result<(), AppError> {
        self.store.remove(kind.storage_key()).await?;
        self.store.remove(&meta_key(kind)).await?;
        self.settings.set_template_flag(kind, None).await?;
        tracing::info!("Deleted {} template", kind.code());
        Ok(())
    }
}
