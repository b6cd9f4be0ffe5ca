//! Pipeline controller: detect, record, index, upload, rotate.
//!
//! Strictly sequential. The controller owns the camera and lends it to the
//! sampler and the recorder in turn. A fault ends the current cycle only;
//! the loop goes back to detecting.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Local};
use mlog_media::{Camera, CameraSampler, MotionDetector, Recorder};
use mlog_models::{ClipRecord, FolderId, FolderName, CLIP_MIME_TYPE};
use mlog_storage::{RemoteStorage, StorageError, StorageIndexer, Uploader};
use tracing::{info, warn, Instrument};

use crate::config::WorkerConfig;
use crate::error::{CycleError, InPhase, WorkerResult};
use crate::logging::CycleLogger;
use crate::metrics;
use crate::retention::RetentionLog;

/// Controller phases, in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineState {
    Authenticating,
    Ready,
    Detecting,
    Recording,
    Indexing,
    Uploading,
    Rotating,
}

impl PipelineState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::Authenticating => "AUTHENTICATING",
            PipelineState::Ready => "READY",
            PipelineState::Detecting => "DETECTING",
            PipelineState::Recording => "RECORDING",
            PipelineState::Indexing => "INDEXING",
            PipelineState::Uploading => "UPLOADING",
            PipelineState::Rotating => "ROTATING",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wall clock used to stamp clips.
pub type Clock = Box<dyn Fn() -> DateTime<Local> + Send + Sync>;

pub struct Pipeline<C: Camera> {
    config: WorkerConfig,
    camera: C,
    remote: Arc<dyn RemoteStorage>,
    detector: MotionDetector,
    recorder: Recorder,
    indexer: StorageIndexer,
    uploader: Uploader,
    retention: RetentionLog,
    folder_cache: HashMap<FolderName, FolderId>,
    state: PipelineState,
    cycles: u64,
    clock: Clock,
}

impl<C: Camera> Pipeline<C> {
    pub fn new(config: WorkerConfig, camera: C, remote: Arc<dyn RemoteStorage>) -> WorkerResult<Self> {
        config.validate()?;

        let detector = MotionDetector::new(config.motion_settings()?);
        let recorder = Recorder::new(config.recording_settings());
        let retention = RetentionLog::new(config.retention_file.clone());

        Ok(Self {
            detector,
            recorder,
            indexer: StorageIndexer::new(Arc::clone(&remote)),
            uploader: Uploader::new(Arc::clone(&remote)),
            remote,
            retention,
            folder_cache: HashMap::new(),
            state: PipelineState::Authenticating,
            cycles: 0,
            clock: Box::new(Local::now),
            camera,
            config,
        })
    }

    /// Replace the wall clock that names day folders and clips.
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Local> + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn retention(&self) -> &RetentionLog {
        &self.retention
    }

    pub fn cached_folder(&self, name: &FolderName) -> Option<&FolderId> {
        self.folder_cache.get(name)
    }

    pub fn cycles(&self) -> u64 {
        self.cycles
    }

    pub fn camera(&self) -> &C {
        &self.camera
    }

    /// Authenticate, initialize the camera and load the retention log.
    ///
    /// Any error here is fatal to the process.
    pub async fn startup(&mut self) -> WorkerResult<()> {
        self.state = PipelineState::Authenticating;
        info!("Authenticating with remote storage");
        self.remote.authenticate().await?;

        self.camera.set_rotation(self.config.rotation)?;
        self.camera.set_exposure_mode(self.config.exposure_mode);
        self.camera.set_white_balance_mode(self.config.white_balance);

        if !self.config.camera_warmup.is_zero() {
            info!("Waiting {:?} for the camera to settle", self.config.camera_warmup);
            tokio::time::sleep(self.config.camera_warmup).await;
        }

        self.retention = RetentionLog::load(self.config.retention_file.clone()).await?;
        metrics::set_retention_days(self.retention.len());
        info!(
            days = self.retention.len(),
            path = %self.retention.path().display(),
            "Loaded retention log"
        );

        self.state = PipelineState::Ready;
        Ok(())
    }

    /// Run cycles until the task is dropped.
    ///
    /// A failed cycle waits one sampling interval before detecting again.
    pub async fn run(&mut self) {
        loop {
            // Faults are logged inside the cycle.
            if self.run_cycle().await.is_err() {
                tokio::time::sleep(self.detector.settings().interval()).await;
            }
        }
    }

    /// Run one detect-to-rotate cycle. A fault is logged before returning.
    pub async fn run_cycle(&mut self) -> Result<ClipRecord, CycleError> {
        self.cycles += 1;
        let logger = CycleLogger::new(self.cycles);
        metrics::record_cycle();

        let span = logger.create_span();
        let result = self.cycle(&logger).instrument(span).await;

        if let Err(e) = &result {
            logger.log_fault(e.phase, e.fault_kind(), &e.source.to_string());
            metrics::record_fault(e.phase, e.fault_kind());
        }
        self.state = PipelineState::Detecting;
        result
    }

    async fn cycle(&mut self, logger: &CycleLogger) -> Result<ClipRecord, CycleError> {
        self.state = PipelineState::Detecting;
        logger.log_phase(self.state, "Detecting motion");
        let started = Instant::now();
        let event = {
            let mut sampler = CameraSampler::new(
                &mut self.camera,
                self.config.low_resolution,
                self.config.color_channel,
            );
            self.detector
                .detect(&mut sampler)
                .await
                .in_phase(PipelineState::Detecting)?
        };
        metrics::record_detection_wait(started.elapsed().as_secs_f64());

        let at = (self.clock)();
        let mut record = ClipRecord::new(&self.config.clips_dir, &at);
        info!(
            changed = event.changed_pixels,
            samples = event.samples,
            folder = %record.date,
            clip = %record.time,
            "Motion detected"
        );

        self.state = PipelineState::Recording;
        logger.log_phase(self.state, "Recording clip");
        tokio::fs::create_dir_all(record.local_dir())
            .await
            .in_phase(PipelineState::Recording)?;
        self.recorder
            .record(&mut self.camera, &record.local_path)
            .await
            .in_phase(PipelineState::Recording)?;

        self.state = PipelineState::Indexing;
        logger.log_phase(self.state, "Resolving day folder");
        let folder_id = self
            .resolve_folder(&record.date)
            .await
            .in_phase(PipelineState::Indexing)?;
        record.remote_folder_id = Some(folder_id.clone());
        if self
            .retention
            .append(&record.date)
            .await
            .in_phase(PipelineState::Indexing)?
        {
            metrics::set_retention_days(self.retention.len());
        }

        self.state = PipelineState::Uploading;
        logger.log_phase(self.state, "Uploading clip");
        let file_id = self
            .uploader
            .upload(&record.local_path, &folder_id, CLIP_MIME_TYPE)
            .await
            .in_phase(PipelineState::Uploading)?;
        record.remote_file_id = Some(file_id);
        metrics::record_upload();

        self.state = PipelineState::Rotating;
        self.rotate(logger).await.in_phase(PipelineState::Rotating)?;

        logger.log_completion(&format!("{}/{}", record.date, record.time));
        Ok(record)
    }

    /// Cached folder id, else the first remote match, else a new folder.
    async fn resolve_folder(&mut self, name: &FolderName) -> WorkerResult<FolderId> {
        if let Some(id) = self.folder_cache.get(name) {
            return Ok(id.clone());
        }

        let id = self.indexer.ensure_folder(name).await?;
        self.folder_cache.insert(name.clone(), id.clone());
        Ok(id)
    }

    /// Evict days beyond the retention window, remote folder first.
    ///
    /// An evicted name leaves memory before its folder is deleted and the file
    /// is rewritten only after cleanup succeeds. A failed cleanup puts the name
    /// back at the old end, so the next rotation retries it.
    async fn rotate(&mut self, logger: &CycleLogger) -> WorkerResult<()> {
        while let Some(evicted) = self.retention.rotate(self.config.retention_window_days) {
            logger.log_phase(self.state, &format!("Evicting {}", evicted));

            if let Err(e) = self.evict(&evicted, logger).await {
                logger.log_warning(
                    self.state,
                    &format!("Eviction of {} failed, keeping it for the next cycle", evicted),
                );
                self.retention.restore_front(evicted);
                return Err(e);
            }

            self.folder_cache.remove(&evicted);
            metrics::record_eviction();
            metrics::set_retention_days(self.retention.len());
            info!(folder = %evicted, days = self.retention.len(), "Evicted day");
        }

        Ok(())
    }

    /// Delete one day remotely and locally, then rewrite the log file.
    async fn evict(&mut self, evicted: &FolderName, logger: &CycleLogger) -> WorkerResult<()> {
        let folder_id = match self.folder_cache.get(evicted) {
            Some(id) => Some(id.clone()),
            None => self.indexer.get_folder_id(evicted).await?,
        };
        match folder_id {
            Some(id) => match self.indexer.delete_folder(&id).await {
                Ok(()) => {}
                // Cached id of a folder deleted by an earlier, interrupted eviction.
                Err(StorageError::NotFound(_)) => logger.log_warning(
                    self.state,
                    &format!("Remote folder for {} already gone", evicted),
                ),
                Err(e) => return Err(e.into()),
            },
            None => logger.log_warning(
                self.state,
                &format!("No remote folder for {}, skipping remote delete", evicted),
            ),
        }

        let local_dir = self.config.clips_dir.join(evicted.as_str());
        match tokio::fs::remove_dir_all(&local_dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %local_dir.display(), "Local day directory already gone");
            }
            Err(e) => return Err(e.into()),
        }

        self.retention.persist().await
    }

    /// Release the camera.
    pub async fn shutdown(&mut self) -> WorkerResult<()> {
        info!(cycles = self.cycles, "Releasing camera");
        self.camera.close().await?;
        Ok(())
    }
}
