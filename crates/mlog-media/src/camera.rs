//! Camera collaborator interface.
//!
//! The pipeline owns exactly one `Camera` and lends it by `&mut` to the
//! sampler and the recorder, so a still capture can never overlap a
//! recording.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use mlog_models::{ColorChannel, Resolution};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Exposure program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExposureMode {
    #[default]
    Auto,
    Sport,
    Short,
    Long,
}

impl ExposureMode {
    /// Value understood by `rpicam-* --exposure`.
    pub fn as_rpicam_arg(&self) -> &'static str {
        match self {
            ExposureMode::Auto => "normal",
            ExposureMode::Sport => "sport",
            ExposureMode::Short => "short",
            ExposureMode::Long => "long",
        }
    }
}

impl FromStr for ExposureMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" | "normal" => Ok(ExposureMode::Auto),
            "sport" => Ok(ExposureMode::Sport),
            "short" => Ok(ExposureMode::Short),
            "long" => Ok(ExposureMode::Long),
            other => Err(MediaError::invalid_setting(format!("exposure mode '{}'", other))),
        }
    }
}

impl fmt::Display for ExposureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_rpicam_arg())
    }
}

/// Automatic white balance preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WhiteBalanceMode {
    #[default]
    Auto,
    Incandescent,
    Tungsten,
    Fluorescent,
    Indoor,
    Daylight,
    Cloudy,
}

impl WhiteBalanceMode {
    /// Value understood by `rpicam-* --awb`.
    pub fn as_rpicam_arg(&self) -> &'static str {
        match self {
            WhiteBalanceMode::Auto => "auto",
            WhiteBalanceMode::Incandescent => "incandescent",
            WhiteBalanceMode::Tungsten => "tungsten",
            WhiteBalanceMode::Fluorescent => "fluorescent",
            WhiteBalanceMode::Indoor => "indoor",
            WhiteBalanceMode::Daylight => "daylight",
            WhiteBalanceMode::Cloudy => "cloudy",
        }
    }
}

impl FromStr for WhiteBalanceMode {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "auto" => Ok(WhiteBalanceMode::Auto),
            "incandescent" => Ok(WhiteBalanceMode::Incandescent),
            "tungsten" => Ok(WhiteBalanceMode::Tungsten),
            "fluorescent" => Ok(WhiteBalanceMode::Fluorescent),
            "indoor" => Ok(WhiteBalanceMode::Indoor),
            "daylight" => Ok(WhiteBalanceMode::Daylight),
            "cloudy" => Ok(WhiteBalanceMode::Cloudy),
            other => Err(MediaError::invalid_setting(format!("white balance mode '{}'", other))),
        }
    }
}

impl fmt::Display for WhiteBalanceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_rpicam_arg())
    }
}

/// Capabilities the pipeline needs from a camera.
#[async_trait]
pub trait Camera: Send {
    /// Resolution used by the next still capture or recording.
    fn configure_resolution(&mut self, resolution: Resolution) -> MediaResult<()>;

    /// Frame rate used by the next recording.
    fn configure_framerate(&mut self, fps: u32) -> MediaResult<()>;

    /// Sensor rotation in degrees.
    fn set_rotation(&mut self, degrees: u16) -> MediaResult<()>;

    fn set_exposure_mode(&mut self, mode: ExposureMode);

    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode);

    /// Capture one still at the configured resolution and return a single channel.
    async fn capture_still_frame(&mut self, channel: ColorChannel) -> MediaResult<Frame>;

    /// Begin writing a clip to `path`.
    async fn start_recording(&mut self, path: &Path) -> MediaResult<()>;

    /// Finish the clip started by `start_recording`.
    async fn stop_recording(&mut self) -> MediaResult<()>;

    /// Release the device. Called once on shutdown.
    async fn close(&mut self) -> MediaResult<()>;
}
