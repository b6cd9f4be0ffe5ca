//! `rpicam-still` / `rpicam-vid` command builder.

use std::path::{Path, PathBuf};

use mlog_models::Resolution;

use crate::camera::{ExposureMode, WhiteBalanceMode};
use crate::error::{MediaError, MediaResult};

/// Output written to stdout instead of a file.
pub const STDOUT_OUTPUT: &str = "-";

/// Builder for rpicam commands.
#[derive(Debug, Clone)]
pub struct RpicamCommand {
    /// Binary to launch (`rpicam-still`, `rpicam-vid`, or a libcamera alias)
    program: String,
    /// Output path, `-` for stdout
    output: PathBuf,
    /// Arguments placed before the output
    args: Vec<String>,
}

impl RpicamCommand {
    /// Create a command writing to `output`.
    pub fn new(program: impl Into<String>, output: impl AsRef<Path>) -> Self {
        Self {
            program: program.into(),
            output: output.as_ref().to_path_buf(),
            args: vec!["--nopreview".to_string()],
        }
    }

    /// Command writing to stdout.
    pub fn to_stdout(program: impl Into<String>) -> Self {
        Self::new(program, STDOUT_OUTPUT)
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Select a camera when more than one is attached.
    pub fn camera(self, index: u32) -> Self {
        self.arg("--camera").arg(index.to_string())
    }

    /// Set output width and height.
    pub fn resolution(self, resolution: Resolution) -> Self {
        self.arg("--width")
            .arg(resolution.width.to_string())
            .arg("--height")
            .arg(resolution.height.to_string())
    }

    /// Set recording frame rate.
    pub fn framerate(self, fps: u32) -> Self {
        self.arg("--framerate").arg(fps.to_string())
    }

    /// Set sensor rotation (0 or 180).
    pub fn rotation(self, degrees: u16) -> Self {
        self.arg("--rotation").arg(degrees.to_string())
    }

    pub fn exposure(self, mode: ExposureMode) -> Self {
        self.arg("--exposure").arg(mode.as_rpicam_arg())
    }

    pub fn white_balance(self, mode: WhiteBalanceMode) -> Self {
        self.arg("--awb").arg(mode.as_rpicam_arg())
    }

    /// Run time in milliseconds; 0 runs until signalled.
    pub fn timeout_ms(self, ms: u64) -> Self {
        self.arg("--timeout").arg(ms.to_string())
    }

    /// Still image encoding (`png`, `jpg`, ...).
    pub fn encoding(self, encoding: impl Into<String>) -> Self {
        self.arg("--encoding").arg(encoding)
    }

    /// Video codec (`h264`, ...).
    pub fn codec(self, codec: impl Into<String>) -> Self {
        self.arg("--codec").arg(codec)
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = self.args.clone();
        args.push("--output".to_string());
        args.push(self.output.to_string_lossy().to_string());
        args
    }
}

/// Check that a camera binary is available.
pub fn check_binary(program: &str) -> MediaResult<PathBuf> {
    which::which(program).map_err(|_| MediaError::CameraNotFound(program.to_string()))
}
