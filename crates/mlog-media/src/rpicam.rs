//! Raspberry Pi camera backed by the `rpicam-apps` command line tools.
//!
//! Stills come from `rpicam-still` as PNG on stdout. Clips are written by a
//! long-running `rpicam-vid` that is stopped with SIGINT so the encoder can
//! flush the last frames.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use mlog_models::{ColorChannel, Resolution};
use nix::sys::signal::{self, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::camera::{Camera, ExposureMode, WhiteBalanceMode};
use crate::command::{check_binary, RpicamCommand};
use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;

/// Lines of encoder stderr kept for error reports.
const STDERR_TAIL_LINES: usize = 20;

/// How long `rpicam-vid` gets to exit after SIGINT before it is killed.
const STOP_GRACE: Duration = Duration::from_secs(5);

/// Configuration for the rpicam backend.
#[derive(Debug, Clone)]
pub struct RpiCameraConfig {
    /// Still capture binary
    pub still_program: String,
    /// Video capture binary
    pub video_program: String,
    /// Camera index passed to `--camera`
    pub camera_index: u32,
    /// Sensor settle time for each still, in milliseconds
    pub still_timeout_ms: u64,
}

impl Default for RpiCameraConfig {
    fn default() -> Self {
        Self {
            still_program: "rpicam-still".to_string(),
            video_program: "rpicam-vid".to_string(),
            camera_index: 0,
            still_timeout_ms: 1,
        }
    }
}

/// A clip being written by a child `rpicam-vid`.
struct ActiveRecording {
    child: Child,
    path: PathBuf,
    stderr_tail: JoinHandle<Vec<String>>,
}

/// Camera driven through `rpicam-still` and `rpicam-vid`.
pub struct RpiCamera {
    config: RpiCameraConfig,
    resolution: Resolution,
    framerate: u32,
    rotation: u16,
    exposure: ExposureMode,
    white_balance: WhiteBalanceMode,
    recording: Option<ActiveRecording>,
}

impl RpiCamera {
    /// Open the camera backend, checking both binaries are installed.
    pub fn open(config: RpiCameraConfig) -> MediaResult<Self> {
        check_binary(&config.still_program)?;
        check_binary(&config.video_program)?;

        info!(
            still = %config.still_program,
            video = %config.video_program,
            camera = config.camera_index,
            "Opened rpicam camera"
        );

        Ok(Self {
            config,
            resolution: Resolution::new(640, 480),
            framerate: 30,
            rotation: 0,
            exposure: ExposureMode::default(),
            white_balance: WhiteBalanceMode::default(),
            recording: None,
        })
    }

    /// Arguments shared by stills and clips.
    fn base_command(&self, program: &str, output: impl AsRef<Path>) -> RpicamCommand {
        RpicamCommand::new(program, output)
            .camera(self.config.camera_index)
            .resolution(self.resolution)
            .rotation(self.rotation)
            .exposure(self.exposure)
            .white_balance(self.white_balance)
    }

    fn still_command(&self) -> RpicamCommand {
        self.base_command(&self.config.still_program, crate::command::STDOUT_OUTPUT)
            .timeout_ms(self.config.still_timeout_ms)
            .encoding("png")
    }

    fn video_command(&self, path: &Path) -> RpicamCommand {
        self.base_command(&self.config.video_program, path)
            .framerate(self.framerate)
            .codec("h264")
            .timeout_ms(0)
    }

    fn ensure_idle(&self) -> MediaResult<()> {
        if self.recording.is_some() {
            return Err(MediaError::RecordingInProgress);
        }
        Ok(())
    }

    /// Ask the encoder to finish, killing it if it ignores the signal.
    async fn finish(active: &mut ActiveRecording) -> MediaResult<std::process::ExitStatus> {
        if let Some(status) = active.child.try_wait()? {
            return Ok(status);
        }

        if let Some(pid) = active.child.id() {
            if let Err(e) = signal::kill(Pid::from_raw(pid as i32), Signal::SIGINT) {
                warn!("Failed to signal rpicam-vid ({}), killing it", e);
            }
        }

        match tokio::time::timeout(STOP_GRACE, active.child.wait()).await {
            Ok(status) => Ok(status?),
            Err(_) => {
                warn!("rpicam-vid ignored SIGINT for {:?}, killing it", STOP_GRACE);
                active.child.kill().await?;
                Ok(active.child.wait().await?)
            }
        }
    }
}

#[async_trait]
impl Camera for RpiCamera {
    fn configure_resolution(&mut self, resolution: Resolution) -> MediaResult<()> {
        if resolution.pixel_count() == 0 {
            return Err(MediaError::invalid_setting(format!("resolution {}", resolution)));
        }
        self.resolution = resolution;
        Ok(())
    }

    fn configure_framerate(&mut self, fps: u32) -> MediaResult<()> {
        if fps == 0 {
            return Err(MediaError::invalid_setting("framerate must be positive"));
        }
        self.framerate = fps;
        Ok(())
    }

    fn set_rotation(&mut self, degrees: u16) -> MediaResult<()> {
        match degrees {
            0 | 180 => {
                self.rotation = degrees;
                Ok(())
            }
            other => Err(MediaError::invalid_setting(format!(
                "rotation {} (rpicam supports 0 or 180)",
                other
            ))),
        }
    }

    fn set_exposure_mode(&mut self, mode: ExposureMode) {
        self.exposure = mode;
    }

    fn set_white_balance_mode(&mut self, mode: WhiteBalanceMode) {
        self.white_balance = mode;
    }

    async fn capture_still_frame(&mut self, channel: ColorChannel) -> MediaResult<Frame> {
        self.ensure_idle()?;

        let cmd = self.still_command();
        let args = cmd.build_args();
        debug!("Running {} {}", cmd.program(), args.join(" "));

        let output = Command::new(cmd.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| MediaError::camera_failed(format!("spawn {}: {}", cmd.program(), e), None, None))?;

        if !output.status.success() {
            return Err(MediaError::camera_failed(
                "still capture exited with non-zero status",
                Some(String::from_utf8_lossy(&output.stderr).into_owned()),
                output.status.code(),
            ));
        }

        let frame = Frame::decode(&output.stdout, channel)?;
        if frame.resolution() != self.resolution {
            return Err(MediaError::FrameMismatch {
                expected: self.resolution,
                actual: frame.resolution(),
            });
        }

        Ok(frame)
    }

    async fn start_recording(&mut self, path: &Path) -> MediaResult<()> {
        self.ensure_idle()?;

        let cmd = self.video_command(path);
        let args = cmd.build_args();
        info!(
            "Starting {}: {} @ {}fps -> {}",
            cmd.program(),
            self.resolution,
            self.framerate,
            path.display()
        );
        debug!("{} args: {:?}", cmd.program(), args);

        let mut child = Command::new(cmd.program())
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| MediaError::camera_failed(format!("spawn {}: {}", cmd.program(), e), None, None))?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| MediaError::camera_failed("stderr not captured", None, None))?;

        // rpicam-vid logs every frame to stderr; drain it so the pipe never fills.
        let stderr_tail = tokio::spawn(async move {
            let mut reader = BufReader::new(stderr).lines();
            let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
            while let Ok(Some(line)) = reader.next_line().await {
                push_tail(&mut tail, line);
            }
            Vec::from(tail)
        });

        self.recording = Some(ActiveRecording {
            child,
            path: path.to_path_buf(),
            stderr_tail,
        });
        Ok(())
    }

    async fn stop_recording(&mut self) -> MediaResult<()> {
        let mut active = self.recording.take().ok_or(MediaError::NotRecording)?;

        let exited_early = active.child.try_wait()?.is_some();
        let status = Self::finish(&mut active).await?;
        let tail = active.stderr_tail.await.unwrap_or_default().join("\n");

        // An encoder that died before we asked it to stop never produced a full clip.
        if exited_early && !status.success() {
            return Err(MediaError::camera_failed(
                "rpicam-vid exited before recording finished",
                Some(tail),
                status.code(),
            ));
        }

        match tokio::fs::metadata(&active.path).await {
            Ok(meta) if meta.len() > 0 => {
                info!("Recording stopped: {} ({} bytes)", active.path.display(), meta.len());
                Ok(())
            }
            _ => {
                warn!("rpicam-vid stderr: {}", tail);
                Err(MediaError::RecordingMissing(active.path))
            }
        }
    }

    async fn close(&mut self) -> MediaResult<()> {
        if self.recording.is_some() {
            warn!("Camera closed while recording, stopping clip");
            self.stop_recording().await?;
        }
        info!("Camera released");
        Ok(())
    }
}

/// Keep the last `STDERR_TAIL_LINES` lines.
fn push_tail(tail: &mut VecDeque<String>, line: String) {
    if tail.len() == STDERR_TAIL_LINES {
        tail.pop_front();
    }
    tail.push_back(line);
}
