//! History ledger: bounded, most-recent-first list of generation runs.

use crate::errors::AppError;
use crate::models::HistoryEntry;
use crate::store::{keys, ObjectStoreExt, StoreHandle};

/// Maximum number of entries retained. Older entries are evicted on append.
pub const MAX_HISTORY_ENTRIES: usize = 50;

const CSV_HEADER: [&str; 6] = ["CDPSP", "Fecha", "Ambientes", "Tipos FR", "Archivos", "Carpeta"];

#[derive(Clone)]
pub struct HistoryLedger {
    store: StoreHandle,
}

impl HistoryLedger {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// All entries, most recent first.
    pub async fn list(&self) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self
            .store
            .get_json(keys::HISTORY)
            .await?
            .unwrap_or_default())
    }

    /// Prepend `entry` and drop anything beyond the retention bound.
    pub async fn append(&self, entry: HistoryEntry) -> Result<(), AppError> {
        let mut entries = self.list().await?;
        entries.insert(0, entry);
        entries.truncate(MAX_HISTORY_ENTRIES);
        self.store.set_json(keys::HISTORY, &entries).await
    }

    /// Remove the entry with `id`. Missing ids are ignored.
    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let mut entries = self.list().await?;
        let before = entries.len();
        entries.retain(|e| e.id != id);
        if entries.len() != before {
            self.store.set_json(keys::HISTORY, &entries).await?;
        }
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        self.store
            .set_json(keys::HISTORY, &Vec::<HistoryEntry>::new())
            .await
    }

    /// Case-insensitive substring search over case id and creation date.
    pub async fn search(&self, text: &str) -> Result<Vec<HistoryEntry>, AppError> {
        let needle = text.trim().to_lowercase();
        let entries = self.list().await?;
        if needle.is_empty() {
            return Ok(entries);
        }
        Ok(entries
            .into_iter()
            .filter(|e| matches_query(e, &needle))
            .collect())
    }

    /// Render the ledger as CSV.
    pub async fn export_csv(&self) -> Result<String, AppError> {
        let entries = self.list().await?;
        let mut lines = Vec::with_capacity(entries.len() + 1);
        lines.push(CSV_HEADER.join(","));

        for entry in &entries {
            let environments: Vec<&str> = entry.environments.iter().map(|e| e.as_str()).collect();
            let kinds: Vec<&str> = entry.kinds.iter().map(|k| k.as_str()).collect();
            let row = [
                entry.case_id.clone(),
                entry.display_date(),
                environments.join(", "),
                kinds.join(", "),
                entry.generated_files.len().to_string(),
                entry.output_folder.clone(),
            ];
            let fields: Vec<String> = row.iter().map(|f| csv_field(f)).collect();
            lines.push(fields.join(","));
        }

        Ok(lines.join("\n"))
    }
}

fn matches_query(entry: &HistoryEntry, needle: &str) -> bool {
    entry.case_id.to_lowercase().contains(needle)
        || entry.created_at.to_rfc3339().to_lowercase().contains(needle)
        || entry.display_date().contains(needle)
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Environment, FormKind};
    use crate::store::MemoryObjectStore;
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;

    fn ledger() -> HistoryLedger {
        HistoryLedger::new(Arc::new(MemoryObjectStore::new("test")))
    }

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry {
            id: format!("entry-{}", n),
            case_id: format!("CDP-{:03}", n),
            category: None,
            created_at: Utc.with_ymd_and_hms(2024, 3, 5, 10, 0, 0).unwrap(),
            environments: vec![Environment::QA],
            kinds: vec![FormKind::Database],
            generated_files: vec![format!("FR_CDP-{:03}_FBD_QA.xlsx", n)],
            output_folder: format!("/out/FR_CDP-{:03}", n),
        }
    }

    #[tokio::test]
    async fn test_append_is_most_recent_first() {
        let ledger = ledger();
        ledger.append(entry(1)).await.unwrap();
        ledger.append(entry(2)).await.unwrap();

        let ids: Vec<_> = ledger.list().await.unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["entry-2", "entry-1"]);
    }

    #[tokio::test]
    async fn test_retention_bound() {
        let ledger = ledger();
        for n in 1..=51 {
            ledger.append(entry(n)).await.unwrap();
        }

        let entries = ledger.list().await.unwrap();
        assert_eq!(entries.len(), MAX_HISTORY_ENTRIES);
        assert_eq!(entries[0].id, "entry-51");
        assert!(entries.iter().all(|e| e.id != "entry-1"));
    }

    #[tokio::test]
    async fn test_remove_and_clear() {
        let ledger = ledger();
        ledger.append(entry(1)).await.unwrap();
        ledger.append(entry(2)).await.unwrap();

        ledger.remove("entry-1").await.unwrap();
        ledger.remove("entry-1").await.unwrap();
        assert_eq!(ledger.list().await.unwrap().len(), 1);

        ledger.clear().await.unwrap();
        assert!(ledger.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_by_case_id_and_date() {
        let ledger = ledger();
        ledger.append(entry(7)).await.unwrap();
        ledger.append(entry(12)).await.unwrap();

        let hits = ledger.search("cdp-007").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].case_id, "CDP-007");

        assert_eq!(ledger.search("5/3/2024").await.unwrap().len(), 2);
        assert_eq!(ledger.search("2024-03-05").await.unwrap().len(), 2);
        assert_eq!(ledger.search("  ").await.unwrap().len(), 2);
        assert!(ledger.search("CDP-999").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_csv() {
        let ledger = ledger();
        let mut e = entry(1);
        e.environments = vec![Environment::QA, Environment::PROD];
        e.kinds = vec![FormKind::Database, FormKind::Application];
        ledger.append(e).await.unwrap();

        let csv = ledger.export_csv().await.unwrap();
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines[0], "CDPSP,Fecha,Ambientes,Tipos FR,Archivos,Carpeta");
        assert_eq!(
            lines[1],
            "CDP-001,5/3/2024,\"QA, PROD\",\"Database, Application\",1,/out/FR_CDP-001"
        );
    }
}
