//! Download shelf: generated files held for the UI when they could not be written
//! to the output folder.
//!
//! The shelf only holds the files of the latest fallback run; each run clears it first.

use crate::errors::AppError;
use crate::store::{keys, StoreHandle};

#[derive(Clone)]
pub struct DownloadShelf {
    store: StoreHandle,
}

fn shelf_key(file_name: &str) -> String {
    format!("{}{}", keys::DOWNLOAD_PREFIX, file_name)
}

impl DownloadShelf {
    pub fn new(store: StoreHandle) -> Self {
        Self { store }
    }

    /// Offer `content` for download under `file_name`, replacing any earlier offer.
    pub async fn offer(&self, file_name: &str, content: &[u8]) -> Result<(), AppError> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) {
            return Err(AppError::Validation(format!(
                "Invalid download name '{}'",
                file_name
            )));
        }
        self.store.set(&shelf_key(file_name), content).await?;
        tracing::info!("Offered {} for download ({} bytes)", file_name, content.len());
        Ok(())
    }

    pub async fn get(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        self.store
            .get(&shelf_key(file_name))
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Download {} not found", file_name)))
    }

    /// Get a download and remove it from the shelf.
    pub async fn take(&self, file_name: &str) -> Result<Vec<u8>, AppError> {
        let content = self.get(file_name).await?;
        self.remove(file_name).await?;
        Ok(content)
    }

    /// File names currently on the shelf, sorted.
    pub async fn list(&self) -> Result<Vec<String>, AppError> {
        let keys = self.store.list(keys::DOWNLOAD_PREFIX).await?;
        Ok(keys
            .into_iter()
            .filter_map(|k| k.strip_prefix(keys::DOWNLOAD_PREFIX).map(str::to_string))
            .collect())
    }

    pub async fn remove(&self, file_name: &str) -> Result<(), AppError> {
        self.store.remove(&shelf_key(file_name)).await
    }

    /// Drop every file on the shelf. Other store keys are left alone.
    pub async fn clear(&self) -> Result<(), AppError> {
        let keys = self.store.list(keys::DOWNLOAD_PREFIX).await?;
        for key in &keys {
            self.store.remove(key).await?;
        }
        if !keys.is_empty() {
            tracing::info!("Cleared {} file(s) from the download shelf", keys.len());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryObjectStore, ObjectStore};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_offer_list_take() {
        let store = Arc::new(MemoryObjectStore::new("test"));
        store.set("fr_history", b"[]").await.unwrap();
        let shelf = DownloadShelf::new(store);

        shelf.offer("b.xlsx", b"bb").await.unwrap();
        shelf.offer("a.docx", b"a").await.unwrap();
        assert_eq!(shelf.list().await.unwrap(), vec!["a.docx", "b.xlsx"]);

        assert_eq!(shelf.take("a.docx").await.unwrap(), b"a".to_vec());
        assert_eq!(shelf.list().await.unwrap(), vec!["b.xlsx"]);
        assert!(matches!(
            shelf.get("a.docx").await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_keeps_other_keys() {
        let store = Arc::new(MemoryObjectStore::new("test"));
        store.set("fr_history", b"[]").await.unwrap();
        let shelf = DownloadShelf::new(store.clone());
        shelf.offer("a.docx", b"a").await.unwrap();
        shelf.offer("b.xlsx", b"b").await.unwrap();

        shelf.clear().await.unwrap();

        assert!(shelf.list().await.unwrap().is_empty());
        assert_eq!(store.get("fr_history").await.unwrap(), Some(b"[]".to_vec()));
    }

    #[tokio::test]
    async fn test_offer_rejects_paths() {
        let shelf = DownloadShelf::new(Arc::new(MemoryObjectStore::new("test")));
        assert!(matches!(
            shelf.offer("../x.xlsx", b"x").await,
            Err(AppError::Validation(_))
        ));
    }
}
