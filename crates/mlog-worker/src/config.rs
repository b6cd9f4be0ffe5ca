//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use mlog_media::{ExposureMode, MotionSettings, RecordingSettings, RpiCameraConfig, WhiteBalanceMode};
use mlog_models::{ColorChannel, Resolution};
use tracing::warn;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration. Immutable once the pipeline starts.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Root for the per-day clip directories
    pub clips_dir: PathBuf,
    /// Retention log file, one day folder name per line
    pub retention_file: PathBuf,
    /// Resolution used for motion sampling
    pub low_resolution: Resolution,
    /// Resolution used for recording
    pub high_resolution: Resolution,
    /// Motion samples per second
    pub sample_frequency_hz: f64,
    /// Recording frame rate
    pub recording_fps: u32,
    /// Length of each clip
    pub recording_duration: Duration,
    /// Per-pixel change threshold, 0-255
    pub pixel_threshold: u32,
    /// Changed pixels a frame must exceed to count as motion
    pub frame_sensitivity: usize,
    /// Days of clips kept locally and remotely
    pub retention_window_days: usize,
    /// Channel compared by the detector
    pub color_channel: ColorChannel,
    /// Sensor rotation in degrees
    pub rotation: u16,
    pub exposure_mode: ExposureMode,
    pub white_balance: WhiteBalanceMode,
    /// Settle time after camera initialization
    pub camera_warmup: Duration,
    pub still_program: String,
    pub video_program: String,
    pub camera_index: u32,
    /// Prometheus listener address, disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            clips_dir: PathBuf::from("."),
            retention_file: PathBuf::from("folder_list.txt"),
            low_resolution: Resolution::new(128, 96),
            high_resolution: Resolution::new(640, 480),
            sample_frequency_hz: 2.0,
            recording_fps: 10,
            recording_duration: Duration::from_secs(10),
            pixel_threshold: 25,
            frame_sensitivity: 400,
            retention_window_days: 7,
            color_channel: ColorChannel::Red,
            rotation: 0,
            exposure_mode: ExposureMode::Auto,
            white_balance: WhiteBalanceMode::Auto,
            camera_warmup: Duration::from_secs(5),
            still_program: "rpicam-still".to_string(),
            video_program: "rpicam-vid".to_string(),
            camera_index: 0,
            metrics_addr: None,
        }
    }
}

/// Parse an environment variable, falling back to `default` when unset or invalid.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                warn!("Ignoring invalid {}={:?}, using default", key, raw);
                default
            }
        },
        Err(_) => default,
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            clips_dir: std::env::var("MOTIONLOG_CLIPS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.clips_dir),
            retention_file: std::env::var("MOTIONLOG_RETENTION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.retention_file),
            low_resolution: env_or("MOTIONLOG_LOW_RES", defaults.low_resolution),
            high_resolution: env_or("MOTIONLOG_HIGH_RES", defaults.high_resolution),
            sample_frequency_hz: env_or("MOTIONLOG_FREQUENCY_HZ", defaults.sample_frequency_hz),
            recording_fps: env_or("MOTIONLOG_FPS", defaults.recording_fps),
            recording_duration: Duration::from_secs(env_or(
                "MOTIONLOG_DURATION_SECS",
                defaults.recording_duration.as_secs(),
            )),
            pixel_threshold: env_or("MOTIONLOG_THRESHOLD", defaults.pixel_threshold),
            frame_sensitivity: env_or("MOTIONLOG_SENSITIVITY", defaults.frame_sensitivity),
            retention_window_days: env_or("MOTIONLOG_RETENTION_DAYS", defaults.retention_window_days),
            color_channel: env_or("MOTIONLOG_CHANNEL", defaults.color_channel),
            rotation: env_or("MOTIONLOG_ROTATION", defaults.rotation),
            exposure_mode: env_or("MOTIONLOG_EXPOSURE", defaults.exposure_mode),
            white_balance: env_or("MOTIONLOG_AWB", defaults.white_balance),
            camera_warmup: Duration::from_secs(env_or(
                "MOTIONLOG_WARMUP_SECS",
                defaults.camera_warmup.as_secs(),
            )),
            still_program: std::env::var("MOTIONLOG_STILL_PROGRAM").unwrap_or(defaults.still_program),
            video_program: std::env::var("MOTIONLOG_VIDEO_PROGRAM").unwrap_or(defaults.video_program),
            camera_index: env_or("MOTIONLOG_CAMERA_INDEX", defaults.camera_index),
            metrics_addr: std::env::var("MOTIONLOG_METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        if !self.sample_frequency_hz.is_finite() || self.sample_frequency_hz <= 0.0 {
            return Err(WorkerError::config_error("sample frequency must be positive"));
        }
        if self.recording_fps == 0 {
            return Err(WorkerError::config_error("recording fps must be positive"));
        }
        if self.recording_duration.is_zero() {
            return Err(WorkerError::config_error("recording duration must be positive"));
        }
        if self.retention_window_days == 0 {
            return Err(WorkerError::config_error("retention window must be at least one day"));
        }
        if self.pixel_threshold > 255 {
            return Err(WorkerError::config_error(format!(
                "pixel threshold must be within 0-255, got {}",
                self.pixel_threshold
            )));
        }
        for res in [self.low_resolution, self.high_resolution] {
            if res.width == 0 || res.height == 0 {
                return Err(WorkerError::config_error(format!("resolution must be non-zero, got {}", res)));
            }
        }

        if self.frame_sensitivity >= self.low_resolution.pixel_count() {
            warn!(
                sensitivity = self.frame_sensitivity,
                pixels = self.low_resolution.pixel_count(),
                "Frame sensitivity is not below the pixel count, motion will never be detected"
            );
        }

        Ok(())
    }

    pub fn motion_settings(&self) -> WorkerResult<MotionSettings> {
        let threshold = u8::try_from(self.pixel_threshold)
            .map_err(|_| WorkerError::config_error("pixel threshold must be within 0-255"))?;
        Ok(MotionSettings::new(
            self.sample_frequency_hz,
            threshold,
            self.frame_sensitivity,
        )?)
    }

    pub fn recording_settings(&self) -> RecordingSettings {
        RecordingSettings {
            resolution: self.high_resolution,
            fps: self.recording_fps,
            duration: self.recording_duration,
        }
    }

    pub fn camera_config(&self) -> RpiCameraConfig {
        RpiCameraConfig {
            still_program: self.still_program.clone(),
            video_program: self.video_program.clone(),
            camera_index: self.camera_index,
            ..RpiCameraConfig::default()
        }
    }
}
