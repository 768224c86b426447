//! Settings repository: the persisted configuration record, its defaults, and the
//! JSON export/import format.

use chrono::Utc;
use serde_json::{Map, Value};

use crate::errors::AppError;
use crate::models::{AppSettings, TemplateKind};
use crate::store::{keys, ObjectStoreExt, StoreHandle};

/// Placeholder written in place of template names in exported settings.
pub const TEMPLATE_PLACEHOLDER: &str = "(template guardado)";

/// Version stamped on exported documents.
pub const EXPORT_VERSION: &str = "1.0.0";

/// Fields that an import never applies.
const IMPORT_STRIPPED_FIELDS: [&str; 3] = ["templates", "exportedAt", "exportVersion"];

/// Repository for the configuration record.
#[derive(Clone)]
pub struct SettingsRepository {
    store: StoreHandle,
}

impl SettingsRepository {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Load the stored settings, if the first run has happened.
    pub async fn load(&self) -> Result<Option<AppSettings>, AppError> {
        self.store.get_json(keys::CONFIGURATION).await
    }

    /// Load the stored settings, creating the defaults on first run.
    pub async fn load_or_create(&self) -> Result<AppSettings, AppError> {
        match self.load().await? {
            Some(settings) => Ok(settings),
            None => {
                tracing::info!("No settings found, creating defaults");
                self.reset().await
            }
        }
    }

    /// Persist `settings`, stamping the update time. Returns what was stored.
    pub async fn save(&self, mut settings: AppSettings) -> Result<AppSettings, AppError> {
        settings.updated_at = Utc::now();
        self.store
            .set_json(keys::CONFIGURATION, &settings)
            .await?;
        Ok(settings)
    }

    /// Replace the settings with fresh defaults.
    ///
    /// Template flags are carried over so they keep matching the stored templates.
    pub async fn reset(&self) -> Result<AppSettings, AppError> {
        let previous_templates = self.load().await?.map(|s| s.templates);
        let mut settings = AppSettings::with_defaults(new_settings_id(), Utc::now());
        if let Some(templates) = previous_templates {
            settings.templates = templates;
        }
        self.save(settings).await
    }

    /// Update the denormalized "has template" flag for `kind`.
    pub async fn set_template_flag(
        &self,
        kind: TemplateKind,
        name: Option<String>,
    ) -> Result<(), AppError> {
        let mut settings = self.load_or_create().await?;
        settings.templates.set(kind, name);
        self.save(settings).await?;
        Ok(())
    }

    /// Export the settings as a pretty-printed JSON document.
    pub async fn export_json(&self) -> Result<String, AppError> {
        let settings = self
            .load()
            .await?
            .ok_or_else(|| AppError::NotFound("No settings to export".to_string()))?;

        let mut value = serde_json::to_value(&settings)?;
        let object = value
            .as_object_mut()
            .ok_or_else(|| AppError::Internal("Settings did not serialize to an object".into()))?;

        let mut templates = Map::new();
        for kind in TemplateKind::ALL {
            let placeholder = settings
                .templates
                .get(kind)
                .map(|_| Value::String(TEMPLATE_PLACEHOLDER.to_string()))
                .unwrap_or(Value::Null);
            templates.insert(template_field(kind).to_string(), placeholder);
        }
        object.insert("templates".to_string(), Value::Object(templates));
        object.insert(
            "exportedAt".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );
        object.insert(
            "exportVersion".to_string(),
            Value::String(EXPORT_VERSION.to_string()),
        );

        Ok(serde_json::to_string_pretty(&value)?)
    }

    /// Import a document produced by [`Self::export_json`].
    ///
    /// Top-level fields replace the current ones; templates are never touched.
    pub async fn import_json(&self, json: &str) -> Result<AppSettings, AppError> {
        let imported: Value = serde_json::from_str(json)
            .map_err(|e| AppError::Validation(format!("Invalid settings document: {}", e)))?;
        let Value::Object(mut imported) = imported else {
            return Err(AppError::Validation(
                "Settings document must be a JSON object".to_string(),
            ));
        };

        for required in ["id", "version"] {
            let present = imported
                .get(required)
                .and_then(Value::as_str)
                .is_some_and(|s| !s.trim().is_empty());
            if !present {
                return Err(AppError::Validation(format!(
                    "Settings document is missing '{}'",
                    required
                )));
            }
        }
        for field in IMPORT_STRIPPED_FIELDS {
            imported.remove(field);
        }

        let current = self.load_or_create().await?;
        let templates = current.templates.clone();
        let mut merged = serde_json::to_value(&current)?;
        if let Some(target) = merged.as_object_mut() {
            for (key, value) in imported {
                target.insert(key, value);
            }
        }

        let mut settings: AppSettings = serde_json::from_value(merged)
            .map_err(|e| AppError::Validation(format!("Invalid settings document: {}", e)))?;
        settings.templates = templates;

        tracing::info!("Imported settings {}", settings.id);
        self.save(settings).await
    }
}

fn template_field(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Database => "database",
        TemplateKind::Application => "application",
        TemplateKind::Test => "test",
    }
}

fn new_settings_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
