//! Template slot model.

use serde::{Deserialize, Serialize};

/// The three template slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Database change form (spreadsheet)
    #[serde(alias = "FBD", alias = "fbd")]
    Database,
    /// Application deployment form (spreadsheet)
    #[serde(alias = "FDA", alias = "fda")]
    Application,
    /// Unit test document
    #[serde(alias = "PU", alias = "pu")]
    Test,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::Database,
        TemplateKind::Application,
        TemplateKind::Test,
    ];

    /// Object store key holding the template content.
    pub fn storage_key(&self) -> &'static str {
        match self {
            TemplateKind::Database => "template_fbd",
            TemplateKind::Application => "template_fda",
            TemplateKind::Test => "template_pu",
        }
    }

    /// Short form code used in file names and URLs.
    pub fn code(&self) -> &'static str {
        match self {
            TemplateKind::Database => "FBD",
            TemplateKind::Application => "FDA",
            TemplateKind::Test => "PU",
        }
    }

    /// Parse a kind from its code or name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "fbd" | "database" => Some(TemplateKind::Database),
            "fda" | "application" => Some(TemplateKind::Application),
            "pu" | "test" => Some(TemplateKind::Test),
            _ => None,
        }
    }
}

/// Template metadata stored beside the binary content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateInfo {
    pub kind: TemplateKind,
    pub display_name: String,
    pub size: u64,
    pub uploaded_at: String,
}

/// A template with its content.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateRecord {
    pub info: TemplateInfo,
    pub binary_content: Vec<u8>,
}
