//! Filesystem surface used to deliver generated files.

use std::path::Path;

use async_trait::async_trait;

use crate::errors::AppError;

/// Destination for generated files.
#[async_trait]
pub trait OutputSink: Send + Sync {
    /// Create `path` and any missing parents.
    async fn create_folder(&self, path: &Path) -> Result<(), AppError>;

    /// Write `content` to `path`, replacing an existing file.
    async fn write_binary_file(&self, path: &Path, content: &[u8]) -> Result<(), AppError>;
}

/// Writes to the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsOutput;

#[async_trait]
impl OutputSink for FsOutput {
    async fn create_folder(&self, path: &Path) -> Result<(), AppError> {
        tokio::fs::create_dir_all(path).await.map_err(|e| {
            AppError::FolderCreationFailure(format!("Cannot create {}: {}", path.display(), e))
        })
    }

    async fn write_binary_file(&self, path: &Path, content: &[u8]) -> Result<(), AppError> {
        tokio::fs::write(path, content).await.map_err(|e| {
            AppError::Internal(format!("Cannot write {}: {}", path.display(), e))
        })
    }
}
