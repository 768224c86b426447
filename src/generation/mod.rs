//! Generation pipeline: fills the spreadsheet templates, builds the test document and
//! delivers every file for each requested environment.

pub mod document;
pub mod ooxml;
pub mod output;
pub mod spreadsheet;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};

pub use document::DocumentGenerator;
pub use output::{FsOutput, OutputSink};
pub use spreadsheet::SpreadsheetGenerator;

use crate::config::SheetLayout;
use crate::downloads::DownloadShelf;
use crate::errors::AppError;
use crate::history::HistoryLedger;
use crate::models::{BasicInfo, Environment, FormKind, HistoryEntry, RequestRecord, TemplateKind};
use crate::store::StoreHandle;
use crate::templates::TemplateRepository;

/// Characters that cannot appear in a folder name.
const RESERVED_PATH_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// How generated files reached the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryMode {
    /// Written to the output folder
    Folder,
    /// Held on the download shelf because the folder could not be created
    Download,
}

/// One file that could not be produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitFailure {
    pub section: TemplateKind,
    pub environment: Environment,
    pub code: String,
    pub message: String,
}

/// Result of a `generate_all` run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum GenerationOutcome {
    Completed {
        delivery: DeliveryMode,
        output_folder: String,
        generated_files: Vec<String>,
        history_entry_id: String,
    },
    PartialFailure {
        delivery: DeliveryMode,
        output_folder: String,
        generated_files: Vec<String>,
        failures: Vec<UnitFailure>,
        history_entry_id: String,
    },
    NothingToGenerate {
        delivery: DeliveryMode,
    },
    Failed {
        delivery: DeliveryMode,
        output_folder: String,
        failures: Vec<UnitFailure>,
    },
}

impl GenerationOutcome {
    pub fn delivery(&self) -> DeliveryMode {
        match self {
            GenerationOutcome::Completed { delivery, .. }
            | GenerationOutcome::PartialFailure { delivery, .. }
            | GenerationOutcome::NothingToGenerate { delivery }
            | GenerationOutcome::Failed { delivery, .. } => *delivery,
        }
    }

    pub fn generated_files(&self) -> &[String] {
        match self {
            GenerationOutcome::Completed {
                generated_files, ..
            }
            | GenerationOutcome::PartialFailure {
                generated_files, ..
            } => generated_files,
            _ => &[],
        }
    }

    pub fn failures(&self) -> &[UnitFailure] {
        match self {
            GenerationOutcome::PartialFailure { failures, .. }
            | GenerationOutcome::Failed { failures, .. } => failures,
            _ => &[],
        }
    }
}

/// Replace characters that are not allowed in folder names with `_`.
pub fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if RESERVED_PATH_CHARS.contains(&c) { '_' } else { c })
        .collect()
}

/// `<root>/<category>/FR_<caseId>`, or `<root>/FR_<caseId>` without a category.
pub fn output_folder(root: &Path, info: &BasicInfo) -> PathBuf {
    let leaf = format!("FR_{}", info.case_id);
    match info.category_label() {
        Some(category) => root.join(sanitize_segment(category)).join(leaf),
        None => root.join(leaf),
    }
}

/// Deterministic file name for one generated unit.
pub fn file_name(kind: TemplateKind, case_id: &str, environment: Environment) -> String {
    let env = environment.file_code();
    match kind {
        TemplateKind::Database => format!("FR_{}_FBD_{}.xlsx", case_id, env),
        TemplateKind::Application => format!("FR_{}_FDA_{}.xlsx", case_id, env),
        TemplateKind::Test => format!("{}_PU_{}.docx", case_id, env),
    }
}

/// Sections with content, in generation order.
fn sections_to_generate(record: &RequestRecord) -> Vec<TemplateKind> {
    let mut sections = Vec::with_capacity(3);
    if record.has_database_content() {
        sections.push(TemplateKind::Database);
    }
    if record.has_application_content() {
        sections.push(TemplateKind::Application);
    }
    if record.has_test_content() {
        sections.push(TemplateKind::Test);
    }
    sections
}

fn form_kind(kind: TemplateKind) -> Option<FormKind> {
    match kind {
        TemplateKind::Database => Some(FormKind::Database),
        TemplateKind::Application => Some(FormKind::Application),
        TemplateKind::Test => None,
    }
}

/// Drives generation for a whole request record.
#[derive(Clone)]
pub struct GenerationOrchestrator {
    spreadsheets: SpreadsheetGenerator,
    documents: DocumentGenerator,
    history: HistoryLedger,
    downloads: DownloadShelf,
    output: Arc<dyn OutputSink>,
}

impl GenerationOrchestrator {
    pub fn new(store: StoreHandle, layout: SheetLayout, output: Arc<dyn OutputSink>) -> Self {
        Self {
            spreadsheets: SpreadsheetGenerator::new(TemplateRepository::new(store.clone()), layout),
            documents: DocumentGenerator::new(),
            history: HistoryLedger::new(store.clone()),
            downloads: DownloadShelf::new(store),
            output,
        }
    }

    /// Generate every file the record calls for under `destination_root`.
    ///
    /// Request validation errors abort the run before anything is written. Failures of
    /// individual files are collected into the outcome instead.
    pub async fn generate_all(
        &self,
        record: &RequestRecord,
        destination_root: &Path,
    ) -> Result<GenerationOutcome, AppError> {
        let info = record.validated_basic_info()?;
        let environments = info.environment_set();
        let sections = sections_to_generate(record);

        if sections.is_empty() {
            tracing::info!("Nothing to generate for {}", info.case_id);
            return Ok(GenerationOutcome::NothingToGenerate {
                delivery: DeliveryMode::Folder,
            });
        }

        let folder = output_folder(destination_root, info);
        let delivery = match self.output.create_folder(&folder).await {
            Ok(()) => DeliveryMode::Folder,
            Err(e) => {
                tracing::warn!("Falling back to downloads: {}", e);
                self.downloads.clear().await?;
                DeliveryMode::Download
            }
        };
        let folder_label = match delivery {
            DeliveryMode::Folder => folder.display().to_string(),
            DeliveryMode::Download => String::new(),
        };

        let mut generated_files = Vec::new();
        let mut produced = Vec::new();
        let mut failures = Vec::new();

        for environment in &environments {
            for section in &sections {
                let name = file_name(*section, &info.case_id, *environment);
                let result = match self.produce(*section, record, *environment).await {
                    Ok(content) => self.deliver(delivery, &folder, &name, &content).await,
                    Err(e) => Err(e),
                };

                match result {
                    Ok(()) => {
                        tracing::info!("Generated {}", name);
                        generated_files.push(name);
                        if !produced.contains(section) {
                            produced.push(*section);
                        }
                    }
                    Err(e) => {
                        tracing::warn!(
                            "Failed to generate {} for {}: {}",
                            section.code(),
                            environment.as_str(),
                            e
                        );
                        failures.push(UnitFailure {
                            section: *section,
                            environment: *environment,
                            code: e.error_code().to_string(),
                            message: e.message(),
                        });
                    }
                }
            }
        }

        if generated_files.is_empty() {
            return Ok(GenerationOutcome::Failed {
                delivery,
                output_folder: folder_label,
                failures,
            });
        }

        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            case_id: info.case_id.clone(),
            category: info.category_label().map(str::to_string),
            created_at: Utc::now(),
            environments,
            kinds: sections
                .iter()
                .filter(|s| produced.contains(*s))
                .filter_map(|s| form_kind(*s))
                .collect(),
            generated_files: generated_files.clone(),
            output_folder: folder_label.clone(),
        };
        let history_entry_id = entry.id.clone();
        self.history.append(entry).await?;

        Ok(if failures.is_empty() {
            GenerationOutcome::Completed {
                delivery,
                output_folder: folder_label,
                generated_files,
                history_entry_id,
            }
        } else {
            GenerationOutcome::PartialFailure {
                delivery,
                output_folder: folder_label,
                generated_files,
                failures,
                history_entry_id,
            }
        })
    }

    async fn produce(
        &self,
        section: TemplateKind,
        record: &RequestRecord,
        environment: Environment,
    ) -> Result<Vec<u8>, AppError> {
        match section {
            TemplateKind::Database | TemplateKind::Application => {
                self.spreadsheets
                    .generate(section, record, environment)
                    .await
            }
            TemplateKind::Test => self.documents.generate(record, environment),
        }
    }

    async fn deliver(
        &self,
        delivery: DeliveryMode,
        folder: &Path,
        name: &str,
        content: &[u8],
    ) -> Result<(), AppError> {
        match delivery {
            DeliveryMode::Folder => {
                self.output
                    .write_binary_file(&folder.join(name), content)
                    .await
            }
            DeliveryMode::Download => self.downloads.offer(name, content).await,
        }
    }
}
