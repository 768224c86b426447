//! Persisted application settings, remembered between sessions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::TemplateKind;

/// Current settings schema version.
pub const SETTINGS_VERSION: &str = "1.0.0";

/// A field value plus whether the wizard should prefill it next time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RememberedField<T = String> {
    pub value: T,
    pub remember: bool,
}

impl<T> RememberedField<T> {
    fn remembered(value: T) -> Self {
        Self {
            value,
            remember: true,
        }
    }
}

fn remembered(value: &str) -> RememberedField {
    RememberedField::remembered(value.to_string())
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterDefaults {
    pub name: RememberedField,
    pub area: RememberedField,
    pub phone: RememberedField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerDefaults {
    pub kind: RememberedField,
    pub url_qa: RememberedField,
    pub url_prod: RememberedField,
    pub default_database: RememberedField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlDefaults {
    pub github_organization: RememberedField,
    pub gitlab_organization: RememberedField,
    pub default_namespace: RememberedField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationDefaults {
    pub default_component: RememberedField,
    pub qa_activity: RememberedField,
    pub prod_activity: RememberedField,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestDefaults {
    pub test_kind: RememberedField,
    pub executor: RememberedField,
}

/// Complexity of rolling a change back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Complexity {
    #[serde(alias = "Baja")]
    Low,
    #[default]
    #[serde(alias = "Media")]
    Medium,
    #[serde(alias = "Alta")]
    High,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FallbackDefaults {
    pub complexity: RememberedField<Complexity>,
    pub developer: RememberedField,
    pub manager: RememberedField,
    pub resolution_time: RememberedField,
}

/// Declared names of the registered templates; `None` means no template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateFlags {
    pub database: Option<String>,
    pub application: Option<String>,
    pub test: Option<String>,
}

impl TemplateFlags {
    pub fn get(&self, kind: TemplateKind) -> Option<&String> {
        match kind {
            TemplateKind::Database => self.database.as_ref(),
            TemplateKind::Application => self.application.as_ref(),
            TemplateKind::Test => self.test.as_ref(),
        }
    }

    pub fn set(&mut self, kind: TemplateKind, name: Option<String>) {
        match kind {
            TemplateKind::Database => self.database = name,
            TemplateKind::Application => self.application = name,
            TemplateKind::Test => self.test = name,
        }
    }
}

/// The configuration record stored under `app_configuration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettings {
    pub id: String,
    pub version: String,
    pub requester: RequesterDefaults,
    pub servers: ServerDefaults,
    pub urls: UrlDefaults,
    pub application: ApplicationDefaults,
    pub testing: TestDefaults,
    pub fallback: FallbackDefaults,
    pub templates: TemplateFlags,
    #[serde(default)]
    pub output_folder: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppSettings {
    /// First-run settings.
    pub fn with_defaults(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            version: SETTINGS_VERSION.to_string(),
            requester: RequesterDefaults::default(),
            servers: ServerDefaults {
                kind: remembered("Azure SQL"),
                ..Default::default()
            },
            urls: UrlDefaults {
                github_organization: remembered("https://github.com/bupaseguros"),
                ..Default::default()
            },
            application: ApplicationDefaults {
                default_component: RememberedField::default(),
                qa_activity: remembered("realizar pull desde dev a qa y redesplegar el servicio."),
                prod_activity: remembered(
                    "realizar pull desde qa a master y redesplegar el servicio.",
                ),
            },
            testing: TestDefaults {
                test_kind: remembered("Validación"),
                executor: RememberedField::default(),
            },
            fallback: FallbackDefaults {
                complexity: RememberedField::remembered(Complexity::Medium),
                developer: RememberedField::default(),
                manager: RememberedField::default(),
                resolution_time: remembered("Una hora"),
            },
            templates: TemplateFlags::default(),
            output_folder: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
