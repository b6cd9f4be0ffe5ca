//! Remote storage collaborator interface.

use std::path::Path;

use async_trait::async_trait;
use mlog_models::{FileId, FolderId};
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;

/// A folder as listed by the remote store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteFolder {
    pub id: FolderId,
    pub name: String,
}

/// Operations the pipeline needs from remote storage.
///
/// Implementations perform no retries; every failure surfaces to the caller.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteStorage: Send + Sync {
    /// Prove the credentials work before the first request.
    async fn authenticate(&self) -> StorageResult<()> {
        Ok(())
    }

    /// Folders whose name equals `name`, in the store's listing order.
    async fn list_folders_by_name(&self, name: &str) -> StorageResult<Vec<RemoteFolder>>;

    /// Create a folder. Not idempotent: two calls create two folders.
    async fn create_folder(&self, name: &str) -> StorageResult<FolderId>;

    /// Upload a local file into `parent`, named after the file.
    async fn upload_file(&self, local_path: &Path, parent: &FolderId, mime_type: &str) -> StorageResult<FileId>;

    /// Delete a file or folder (with its contents).
    async fn delete_by_id(&self, id: &str) -> StorageResult<()>;
}
