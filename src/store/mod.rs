//! Key-addressed object store.
//!
//! Every repository in the backend persists through an [`ObjectStore`] handle that is
//! injected at construction time. Values are opaque byte buffers; structured records
//! are stored as JSON through [`ObjectStoreExt`]. Each `get`/`set` on a single key is
//! atomic, cross-key updates are not.

#[cfg(test)]
mod memory;

#[cfg(test)]
pub use memory::MemoryObjectStore;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::errors::AppError;

/// Well-known keys used by the repositories.
pub mod keys {
    pub const CONFIGURATION: &str = "app_configuration";
    pub const HISTORY: &str = "fr_history";
    pub const CATEGORIES: &str = "categories";
    pub const DRAFT: &str = "wizard_draft";
    pub const DOWNLOAD_PREFIX: &str = "download/";
}

/// Shared handle to an object store.
pub type StoreHandle = Arc<dyn ObjectStore>;

/// Persistent key-value store scoped to one namespace.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Get the value stored under `key`, if any.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;

    /// Store `value` under `key`, replacing any previous value.
    async fn set(&self, key: &str, value: &[u8]) -> Result<(), AppError>;

    /// Remove `key`. Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), AppError>;

    /// Remove every key in the namespace.
    async fn clear(&self) -> Result<(), AppError>;

    /// List keys starting with `prefix`, sorted.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, AppError>;

    /// Check whether `key` holds a value.
    async fn contains(&self, key: &str) -> Result<bool, AppError> {
        Ok(self.get(key).await?.is_some())
    }
}

/// JSON record helpers layered over the byte-oriented store.
#[async_trait]
pub trait ObjectStoreExt: ObjectStore {
    /// Read and decode a JSON record.
    async fn get_json<T: DeserializeOwned + Send>(&self, key: &str) -> Result<Option<T>, AppError> {
        match self.get(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Encode and write a JSON record.
    async fn set_json<T: Serialize + Sync>(&self, key: &str, value: &T) -> Result<(), AppError> {
        let bytes = serde_json::to_vec(value)?;
        self.set(key, &bytes).await
    }
}

impl<S: ObjectStore + ?Sized> ObjectStoreExt for S {}
