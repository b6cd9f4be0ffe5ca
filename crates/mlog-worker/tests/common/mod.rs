//! In-memory collaborators for pipeline tests.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, TimeZone};
use mlog_media::{Camera, ExposureMode, Frame, MediaError, MediaResult, WhiteBalanceMode};
use mlog_models::{ColorChannel, FileId, FolderId, Resolution};
use mlog_storage::{RemoteFolder, RemoteStorage, StorageError, StorageResult};
use mlog_worker::WorkerConfig;

/// Camera whose stills alternate between black and white, so every
/// detection wait fires on its first comparison.
#[derive(Default)]
pub struct FlickerCamera {
    pub resolution: Option<Resolution>,
    pub captures: u64,
    pub recording: Option<PathBuf>,
    pub rotation: Option<u16>,
    pub clips: Vec<PathBuf>,
    pub closed: bool,
    pub fail_recording: bool,
    pub fail_stills: bool,
}

#[async_trait]
impl Camera for FlickerCamera {
    fn configure_resolution(&mut self, resolution: Resolution) -> MediaResult<()> {
        self.resolution = Some(resolution);
        Ok(())
    }

    fn configure_framerate(&mut self, _fps: u32) -> MediaResult<()> {
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> MediaResult<()> {
        self.rotation = Some(degrees);
        Ok(())
    }

    fn set_exposure_mode(&mut self, _mode: ExposureMode) {}

    fn set_white_balance_mode(&mut self, _mode: WhiteBalanceMode) {}

    async fn capture_still_frame(&mut self, _channel: ColorChannel) -> MediaResult<Frame> {
        if self.fail_stills {
            return Err(MediaError::camera_failed("no camera detected", None, Some(1)));
        }
        let resolution = self
            .resolution
            .ok_or_else(|| MediaError::invalid_setting("resolution not configured"))?;
        self.captures += 1;
        let value = if self.captures % 2 == 0 { 255 } else { 0 };
        Ok(Frame::filled(resolution, value))
    }

    async fn start_recording(&mut self, path: &Path) -> MediaResult<()> {
        if self.fail_recording {
            return Err(MediaError::camera_failed("device busy", None, None));
        }
        std::fs::write(path, b"\x00\x00\x00\x01h264")?;
        self.recording = Some(path.to_path_buf());
        Ok(())
    }

    async fn stop_recording(&mut self) -> MediaResult<()> {
        let path = self.recording.take().ok_or(MediaError::NotRecording)?;
        self.clips.push(path);
        Ok(())
    }

    async fn close(&mut self) -> MediaResult<()> {
        self.closed = true;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DriveState {
    pub folders: Vec<RemoteFolder>,
    pub files: Vec<(FolderId, String)>,
    pub deleted: Vec<String>,
    pub list_calls: usize,
    pub fail_uploads: bool,
    pub fail_auth: bool,
    /// Remaining deletes that fail with a 503
    pub fail_deletes: usize,
    next_id: u32,
}

/// Remote store kept in memory.
#[derive(Clone, Default)]
pub struct MemoryDrive {
    pub state: Arc<Mutex<DriveState>>,
}

impl MemoryDrive {
    pub fn folder_names(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.folders.iter().map(|f| f.name.clone()).collect()
    }

    pub fn file_count(&self) -> usize {
        self.state.lock().unwrap().files.len()
    }
}

#[async_trait]
impl RemoteStorage for MemoryDrive {
    async fn authenticate(&self) -> StorageResult<()> {
        if self.state.lock().unwrap().fail_auth {
            return Err(StorageError::auth_error("invalid_grant"));
        }
        Ok(())
    }

    async fn list_folders_by_name(&self, name: &str) -> StorageResult<Vec<RemoteFolder>> {
        let mut state = self.state.lock().unwrap();
        state.list_calls += 1;
        Ok(state.folders.iter().filter(|f| f.name == name).cloned().collect())
    }

    async fn create_folder(&self, name: &str) -> StorageResult<FolderId> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = FolderId(format!("folder-{}", state.next_id));
        state.folders.push(RemoteFolder {
            id: id.clone(),
            name: name.to_string(),
        });
        Ok(id)
    }

    async fn upload_file(&self, local_path: &Path, parent: &FolderId, _mime_type: &str) -> StorageResult<FileId> {
        let mut state = self.state.lock().unwrap();
        if state.fail_uploads {
            return Err(StorageError::from_http_status(503, "backend unavailable"));
        }
        if !local_path.exists() {
            return Err(std::io::Error::new(std::io::ErrorKind::NotFound, "clip missing").into());
        }
        state.next_id += 1;
        let name = local_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        state.files.push((parent.clone(), name));
        Ok(FileId(format!("file-{}", state.next_id)))
    }

    async fn delete_by_id(&self, id: &str) -> StorageResult<()> {
        let mut state = self.state.lock().unwrap();
        if state.fail_deletes > 0 {
            state.fail_deletes -= 1;
            return Err(StorageError::from_http_status(503, "flaky"));
        }
        let before = state.folders.len();
        state.folders.retain(|f| f.id.as_str() != id);
        if state.folders.len() == before {
            return Err(StorageError::not_found(id));
        }
        state.files.retain(|(folder, _)| folder.as_str() != id);
        state.deleted.push(id.to_string());
        Ok(())
    }
}

/// Clock that moves to the next calendar day every time it is read.
pub fn daily_clock() -> impl Fn() -> DateTime<Local> + Send + Sync + 'static {
    let day = Arc::new(AtomicU32::new(0));
    move || {
        let n = day.fetch_add(1, Ordering::SeqCst) + 1;
        Local.with_ymd_and_hms(2024, 1, n, 12, 0, 0).unwrap()
    }
}

/// Clock frozen at noon on 2024-01-01.
pub fn fixed_clock() -> impl Fn() -> DateTime<Local> + Send + Sync + 'static {
    || Local.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
}

pub fn test_config(root: &Path) -> WorkerConfig {
    WorkerConfig {
        clips_dir: root.join("clips"),
        retention_file: root.join("folder_list.txt"),
        recording_duration: Duration::from_secs(1),
        camera_warmup: Duration::ZERO,
        ..WorkerConfig::default()
    }
}
