//! Draft store: the in-progress wizard record, saved after every change so a
//! session can be resumed.

use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{
    ApplicationChangeSet, DatabaseChangeSet, FileChange, RequestRecord, SqlScript,
    StoredProcedure, TestCase, TestPlan,
};
use crate::store::{keys, ObjectStoreExt, StoreHandle};

/// A list item edited in place inside one of the draft's sections.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", content = "item", rename_all = "camelCase")]
pub enum DraftItem {
    Script(SqlScript),
    Procedure(StoredProcedure),
    File(FileChange),
    TestCase(TestCase),
}

/// Which list an item id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftList {
    Scripts,
    Procedures,
    Files,
    TestCases,
}

impl DraftList {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "scripts" => Some(DraftList::Scripts),
            "procedures" => Some(DraftList::Procedures),
            "files" => Some(DraftList::Files),
            "testCases" | "cases" => Some(DraftList::TestCases),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct DraftStore {
    store: StoreHandle,
}

impl DraftStore {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    pub async fn load(&self) -> Result<Option<RequestRecord>, AppError> {
        self.store.get_json(keys::DRAFT).await
    }

    pub async fn save(&self, record: &RequestRecord) -> Result<(), AppError> {
        self.store.set_json(keys::DRAFT, record).await
    }

    pub async fn discard(&self) -> Result<(), AppError> {
        self.store.remove(keys::DRAFT).await
    }

    /// Insert or replace one list item, creating its section if needed.
    pub async fn upsert_item(&self, item: DraftItem) -> Result<RequestRecord, AppError> {
        let record = self.load().await?.unwrap_or_default();
        let record = match item {
            DraftItem::Script(script) => {
                let mut section = record.database_section.clone().unwrap_or_default();
                section.upsert_script(script);
                record.with_database_section(Some(section))
            }
            DraftItem::Procedure(procedure) => {
                let mut section = record.database_section.clone().unwrap_or_default();
                section.upsert_procedure(procedure);
                record.with_database_section(Some(section))
            }
            DraftItem::File(file) => {
                let mut section = record.application_section.clone().unwrap_or_default();
                section.upsert_file(file);
                record.with_application_section(Some(section))
            }
            DraftItem::TestCase(case) => {
                let mut section = record.test_section.clone().unwrap_or_default();
                section.upsert_case(case);
                record.with_test_section(Some(section))
            }
        };
        self.save(&record).await?;
        Ok(record)
    }

    /// Remove one list item by id. Unknown ids leave the draft unchanged.
    pub async fn remove_item(&self, list: DraftList, id: &str) -> Result<RequestRecord, AppError> {
        let record = self
            .load()
            .await?
            .ok_or_else(|| AppError::NotFound("No draft in progress".to_string()))?;

        let record = match list {
            DraftList::Scripts | DraftList::Procedures => {
                let section = record.database_section.clone().map(|mut s: DatabaseChangeSet| {
                    if list == DraftList::Scripts {
                        s.remove_script(id);
                    } else {
                        s.remove_procedure(id);
                    }
                    s
                });
                record.with_database_section(section)
            }
            DraftList::Files => {
                let section = record
                    .application_section
                    .clone()
                    .map(|mut s: ApplicationChangeSet| {
                        s.remove_file(id);
                        s
                    });
                record.with_application_section(section)
            }
            DraftList::TestCases => {
                let section = record.test_section.clone().map(|mut s: TestPlan| {
                    s.remove_case(id);
                    s
                });
                record.with_test_section(section)
            }
        };
        self.save(&record).await?;
        Ok(record)
    }
}
