//! Day folders, clip names and clip records.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// File extension of recorded clips (raw H.264 elementary stream).
pub const CLIP_EXTENSION: &str = "h264";

/// Mime type sent with clip uploads.
pub const CLIP_MIME_TYPE: &str = "video/h264";

/// Calendar date that names a local directory, a remote folder and a
/// retention log entry (`YYYY-MM-DD`, local time).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderName(pub String);

impl FolderName {
    /// Folder for the day a timestamp falls on.
    pub fn for_time(at: &DateTime<Local>) -> Self {
        Self(at.format("%Y-%m-%d").to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for FolderName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for FolderName {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// File name of a clip: time of day with microseconds plus the clip extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipName(pub String);

impl ClipName {
    pub fn for_time(at: &DateTime<Local>) -> Self {
        Self(format!("{}.{}", at.format("%H:%M:%S%.6f"), CLIP_EXTENSION))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a folder in remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub String);

impl FolderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FolderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FolderId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FolderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Identifier of an uploaded file in remote storage.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(pub String);

impl FileId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for FileId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for FileId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// One recorded clip, from motion event to upload.
///
/// The remote identifiers stay `None` until indexing and upload succeed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClipRecord {
    pub date: FolderName,
    pub time: ClipName,
    pub local_path: PathBuf,
    pub remote_folder_id: Option<FolderId>,
    pub remote_file_id: Option<FileId>,
}

impl ClipRecord {
    /// Create a record for a motion event detected at `at`, placed under
    /// `clips_dir/<date>/<time>.h264`.
    pub fn new(clips_dir: impl AsRef<Path>, at: &DateTime<Local>) -> Self {
        let date = FolderName::for_time(at);
        let time = ClipName::for_time(at);
        let local_path = clips_dir.as_ref().join(date.as_str()).join(time.as_str());

        Self {
            date,
            time,
            local_path,
            remote_folder_id: None,
            remote_file_id: None,
        }
    }

    /// Local directory holding this clip's day.
    pub fn local_dir(&self) -> &Path {
        self.local_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// True once the clip has a remote file id.
    pub fn is_uploaded(&self) -> bool {
        self.remote_folder_id.is_some() && self.remote_file_id.is_some()
    }
}
