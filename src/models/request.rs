//! Request record collected by the wizard and consumed by the generation pipeline.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

/// Deployment target.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Environment {
    QA,
    PROD,
}

impl Environment {
    /// Code used in generated file names.
    pub fn file_code(&self) -> &'static str {
        match self {
            Environment::QA => "QA",
            Environment::PROD => "PRD",
        }
    }

    /// Label written into generated documents.
    pub fn label(&self) -> &'static str {
        match self {
            Environment::QA => "QA",
            Environment::PROD => "PRODUCCIÓN",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::QA => "QA",
            Environment::PROD => "PROD",
        }
    }
}

fn new_item_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Person filing the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Requester {
    pub name: String,
    pub area: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Mandatory basic fields of a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicInfo {
    pub case_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub requester: Requester,
    pub environments: Vec<Environment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_date: Option<String>,
}

impl BasicInfo {
    /// Environments in first-seen order with duplicates removed.
    pub fn environment_set(&self) -> Vec<Environment> {
        let mut set = Vec::with_capacity(self.environments.len());
        for env in &self.environments {
            if !set.contains(env) {
                set.push(*env);
            }
        }
        set
    }

    /// Category label if set and not blank.
    pub fn category_label(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
    }
}

fn case_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[A-Z0-9-]+$").expect("static pattern"))
}

/// Check a case identifier against the accepted format.
pub fn is_valid_case_id(case_id: &str) -> bool {
    case_id_pattern().is_match(case_id)
}

/// SQL statement classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Create,
    Alter,
    Drop,
    #[serde(alias = "OTROS")]
    Other,
}

impl StatementKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatementKind::Select => "SELECT",
            StatementKind::Insert => "INSERT",
            StatementKind::Update => "UPDATE",
            StatementKind::Delete => "DELETE",
            StatementKind::Create => "CREATE",
            StatementKind::Alter => "ALTER",
            StatementKind::Drop => "DROP",
            StatementKind::Other => "OTHER",
        }
    }
}

/// A SQL script to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SqlScript {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub position: u32,
    pub name: String,
    pub kind: StatementKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub body: String,
}

/// A stored procedure to compile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredProcedure {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub position: u32,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<String>,
}

/// Database changes requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseChangeSet {
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub scripts: Vec<SqlScript>,
    #[serde(default)]
    pub stored_procedures: Vec<StoredProcedure>,
    #[serde(default)]
    pub observations: String,
}

impl DatabaseChangeSet {
    pub fn has_content(&self) -> bool {
        !self.scripts.is_empty() || !self.stored_procedures.is_empty()
    }

    /// Replace the script with the same id, or append it.
    pub fn upsert_script(&mut self, script: SqlScript) {
        upsert_by_id(&mut self.scripts, script, |s| &s.id);
    }

    pub fn remove_script(&mut self, id: &str) {
        self.scripts.retain(|s| s.id != id);
    }

    /// Replace the procedure with the same id, or append it.
    pub fn upsert_procedure(&mut self, procedure: StoredProcedure) {
        upsert_by_id(&mut self.stored_procedures, procedure, |p| &p.id);
    }

    pub fn remove_procedure(&mut self, id: &str) {
        self.stored_procedures.retain(|p| p.id != id);
    }
}

/// Kind of change applied to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeKind {
    #[serde(alias = "Nuevo")]
    Added,
    #[serde(alias = "Modificado")]
    Modified,
    #[serde(alias = "Eliminado")]
    Removed,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Added => "Added",
            ChangeKind::Modified => "Modified",
            ChangeKind::Removed => "Removed",
        }
    }
}

/// A file touched by an application deployment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileChange {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub path: String,
    pub kind: ChangeKind,
    #[serde(default)]
    pub description: String,
}

/// Application deployment changes requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationChangeSet {
    #[serde(default)]
    pub component: String,
    #[serde(default)]
    pub repository_url: String,
    #[serde(default)]
    pub branch: String,
    #[serde(default)]
    pub files: Vec<FileChange>,
    #[serde(default)]
    pub observations: String,
}

impl ApplicationChangeSet {
    pub fn has_content(&self) -> bool {
        !self.files.is_empty()
    }

    pub fn upsert_file(&mut self, file: FileChange) {
        upsert_by_id(&mut self.files, file, |f| &f.id);
    }

    pub fn remove_file(&mut self, id: &str) {
        self.files.retain(|f| f.id != id);
    }
}

/// Execution status of a test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestStatus {
    #[serde(alias = "Pendiente")]
    Pending,
    #[serde(alias = "En Progreso")]
    InProgress,
    #[serde(alias = "Aprobado")]
    Approved,
    #[serde(alias = "Rechazado")]
    Rejected,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Pending => "Pending",
            TestStatus::InProgress => "In Progress",
            TestStatus::Approved => "Approved",
            TestStatus::Rejected => "Rejected",
        }
    }
}

/// A single test case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    #[serde(default = "new_item_id")]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub preconditions: String,
    #[serde(default)]
    pub steps: Vec<String>,
    #[serde(default)]
    pub expected_result: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TestStatus>,
}

/// Test plan for the request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestPlan {
    #[serde(default)]
    pub test_kind: String,
    #[serde(default)]
    pub executor: String,
    #[serde(default)]
    pub tool: String,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    #[serde(default)]
    pub observations: String,
}

impl TestPlan {
    pub fn has_content(&self) -> bool {
        !self.cases.is_empty()
    }

    pub fn upsert_case(&mut self, case: TestCase) {
        upsert_by_id(&mut self.cases, case, |c| &c.id);
    }

    pub fn remove_case(&mut self, id: &str) {
        self.cases.retain(|c| c.id != id);
    }
}

/// Full structured input for one business request.
///
/// Sections are replaced whole; there is no field-level merge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    #[serde(default)]
    pub basic_info: Option<BasicInfo>,
    #[serde(default)]
    pub database_section: Option<DatabaseChangeSet>,
    #[serde(default)]
    pub application_section: Option<ApplicationChangeSet>,
    #[serde(default)]
    pub test_section: Option<TestPlan>,
}

impl RequestRecord {
    /// Check the mandatory fields and return the basic info.
    pub fn validated_basic_info(&self) -> Result<&BasicInfo, AppError> {
        let info = self
            .basic_info
            .as_ref()
            .ok_or_else(|| AppError::InvalidRequest("Basic information is missing".to_string()))?;

        if !is_valid_case_id(&info.case_id) {
            return Err(AppError::InvalidRequest(format!(
                "Case id '{}' must match ^[A-Z0-9-]+$",
                info.case_id
            )));
        }
        if info.title.trim().is_empty() {
            return Err(AppError::InvalidRequest("Title is required".to_string()));
        }
        if info.environments.is_empty() {
            return Err(AppError::InvalidRequest(
                "At least one environment is required".to_string(),
            ));
        }
        Ok(info)
    }

    pub fn with_database_section(mut self, section: Option<DatabaseChangeSet>) -> Self {
        self.database_section = section;
        self
    }

    pub fn with_application_section(mut self, section: Option<ApplicationChangeSet>) -> Self {
        self.application_section = section;
        self
    }

    pub fn with_test_section(mut self, section: Option<TestPlan>) -> Self {
        self.test_section = section;
        self
    }

    pub fn has_database_content(&self) -> bool {
        self.database_section
            .as_ref()
            .is_some_and(DatabaseChangeSet::has_content)
    }

    pub fn has_application_content(&self) -> bool {
        self.application_section
            .as_ref()
            .is_some_and(ApplicationChangeSet::has_content)
    }

    pub fn has_test_content(&self) -> bool {
        self.test_section.as_ref().is_some_and(TestPlan::has_content)
    }
}

fn upsert_by_id<T>(items: &mut Vec<T>, item: T, id_of: impl Fn(&T) -> &String) {
    let id = id_of(&item).clone();
    match items.iter_mut().find(|existing| *id_of(existing) == id) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}
