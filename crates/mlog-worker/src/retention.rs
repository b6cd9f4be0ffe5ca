//! Retention log: the ordered list of days that have uploaded clips.
//!
//! One folder name per line, oldest first. Inserts append a line, evictions
//! rewrite the whole file.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use mlog_models::FolderName;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::WorkerResult;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionLog {
    path: PathBuf,
    entries: VecDeque<FolderName>,
    /// File content does not end with a newline yet.
    unterminated: bool,
}

impl RetentionLog {
    /// Empty log backed by `path`. Nothing is written until the first change.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::from_entries(path, Vec::new())
    }

    pub fn from_entries(path: impl Into<PathBuf>, entries: impl IntoIterator<Item = FolderName>) -> Self {
        Self {
            path: path.into(),
            entries: entries.into_iter().collect(),
            unterminated: false,
        }
    }

    /// Read the log at `path`. A missing file is an empty log.
    pub async fn load(path: impl Into<PathBuf>) -> WorkerResult<Self> {
        let path = path.into();
        let text = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No retention log yet");
                return Ok(Self::new(path));
            }
            Err(e) => return Err(e.into()),
        };

        let unterminated = !text.is_empty() && !text.ends_with('\n');
        let mut log = Self::from_entries(path, Self::parse(&text));
        log.unterminated = unterminated;
        Ok(log)
    }

    /// Parse file content. Blank lines are skipped, later duplicates dropped.
    pub fn parse(text: &str) -> Vec<FolderName> {
        let mut entries: Vec<FolderName> = Vec::new();
        for line in text.lines() {
            let name = line.trim();
            if name.is_empty() || entries.iter().any(|e| e.as_str() == name) {
                continue;
            }
            entries.push(FolderName::from(name));
        }
        entries
    }

    /// Serialized form: every entry on its own newline-terminated line.
    pub fn to_text(&self) -> String {
        let mut text = String::with_capacity(self.entries.len() * 11);
        for entry in &self.entries {
            text.push_str(entry.as_str());
            text.push('\n');
        }
        text
    }

    /// Add `name` at the young end and append it to the file.
    ///
    /// Returns `false` without touching the file when `name` is already logged.
    pub async fn append(&mut self, name: &FolderName) -> WorkerResult<bool> {
        if self.contains(name) {
            return Ok(false);
        }

        let mut line = String::new();
        if self.unterminated {
            line.push('\n');
        }
        line.push_str(name.as_str());
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        self.unterminated = false;
        self.entries.push_back(name.clone());
        debug!(folder = %name, entries = self.entries.len(), "Appended to retention log");
        Ok(true)
    }

    /// Pop the oldest entry when the log holds more than `window` days.
    ///
    /// Only memory changes; call `persist` once the evicted day is cleaned up.
    pub fn rotate(&mut self, window: usize) -> Option<FolderName> {
        if self.entries.len() > window {
            self.entries.pop_front()
        } else {
            None
        }
    }

    /// Put a day back at the old end after its cleanup failed, so the next
    /// rotation evicts it first. No-op when `name` is still logged.
    pub fn restore_front(&mut self, name: FolderName) {
        if !self.contains(&name) {
            self.entries.push_front(name);
        }
    }

    /// Rewrite the file from memory.
    pub async fn persist(&mut self) -> WorkerResult<()> {
        tokio::fs::write(&self.path, self.to_text()).await?;
        self.unterminated = false;
        Ok(())
    }

    pub fn contains(&self, name: &FolderName) -> bool {
        self.entries.iter().any(|e| e == name)
    }

    pub fn entries(&self) -> impl Iterator<Item = &FolderName> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
