//! Generation history model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Environment;

/// Spreadsheet form kinds recorded in history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FormKind {
    Database,
    Application,
}

impl FormKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormKind::Database => "Database",
            FormKind::Application => "Application",
        }
    }
}

/// One completed generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub environments: Vec<Environment>,
    pub kinds: Vec<FormKind>,
    pub generated_files: Vec<String>,
    pub output_folder: String,
}

impl HistoryEntry {
    /// Locale-style date (`d/m/yyyy`) used in exports and search.
    pub fn display_date(&self) -> String {
        self.created_at.format("%-d/%-m/%Y").to_string()
    }
}
