//! Day-folder indexing and clip upload over a `RemoteStorage`.

use std::path::Path;
use std::sync::Arc;

use mlog_models::{FileId, FolderId, FolderName};
use tracing::{debug, info};

use crate::error::StorageResult;
use crate::remote::RemoteStorage;

/// Maps a day folder name to its remote folder id.
#[derive(Clone)]
pub struct StorageIndexer {
    remote: Arc<dyn RemoteStorage>,
}

impl StorageIndexer {
    pub fn new(remote: Arc<dyn RemoteStorage>) -> Self {
        Self { remote }
    }

    /// First folder named `name` in listing order, if any.
    pub async fn get_folder_id(&self, name: &FolderName) -> StorageResult<Option<FolderId>> {
        let folders = self.remote.list_folders_by_name(name.as_str()).await?;
        if folders.len() > 1 {
            debug!(folder = %name, matches = folders.len(), "Multiple remote folders share a name, using the first");
        }
        Ok(folders.into_iter().next().map(|f| f.id))
    }

    /// Create a folder. Callers check `get_folder_id` first.
    pub async fn create_folder(&self, name: &FolderName) -> StorageResult<FolderId> {
        let id = self.remote.create_folder(name.as_str()).await?;
        info!(folder = %name, id = %id, "Created remote day folder");
        Ok(id)
    }

    /// Cached lookup or create, in that order.
    pub async fn ensure_folder(&self, name: &FolderName) -> StorageResult<FolderId> {
        match self.get_folder_id(name).await? {
            Some(id) => Ok(id),
            None => self.create_folder(name).await,
        }
    }

    /// Remove a remote folder and everything in it.
    pub async fn delete_folder(&self, id: &FolderId) -> StorageResult<()> {
        self.remote.delete_by_id(id.as_str()).await?;
        info!(id = %id, "Deleted remote day folder");
        Ok(())
    }
}

/// Transfers local clips into remote folders. No retry.
#[derive(Clone)]
pub struct Uploader {
    remote: Arc<dyn RemoteStorage>,
}

impl Uploader {
    pub fn new(remote: Arc<dyn RemoteStorage>) -> Self {
        Self { remote }
    }

    pub async fn upload(&self, local_path: &Path, folder: &FolderId, mime_type: &str) -> StorageResult<FileId> {
        let id = self.remote.upload_file(local_path, folder, mime_type).await?;
        info!(path = %local_path.display(), folder = %folder, file_id = %id, "Uploaded clip");
        Ok(id)
    }
}
