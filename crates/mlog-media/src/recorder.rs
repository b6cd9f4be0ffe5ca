//! Fixed-duration clip recording.

use std::path::Path;
use std::time::Duration;

use mlog_models::Resolution;
use tracing::info;

use crate::camera::Camera;
use crate::error::{MediaError, MediaResult};

/// Recording parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordingSettings {
    pub resolution: Resolution,
    pub fps: u32,
    pub duration: Duration,
}

/// Records one clip per call.
#[derive(Debug, Clone)]
pub struct Recorder {
    settings: RecordingSettings,
}

impl Recorder {
    pub fn new(settings: RecordingSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &RecordingSettings {
        &self.settings
    }

    /// Record `duration` worth of video into `output`.
    ///
    /// Leaves exactly one file at `output` on success.
    pub async fn record<C: Camera + ?Sized>(&self, camera: &mut C, output: &Path) -> MediaResult<()> {
        let RecordingSettings {
            resolution,
            fps,
            duration,
        } = self.settings;

        camera.configure_resolution(resolution)?;
        camera.configure_framerate(fps)?;

        info!(
            "Recording {:?} at {} {}fps to {}",
            duration,
            resolution,
            fps,
            output.display()
        );
        camera.start_recording(output).await?;
        tokio::time::sleep(duration).await;
        camera.stop_recording().await?;

        if tokio::fs::metadata(output).await.is_err() {
            return Err(MediaError::RecordingMissing(output.to_path_buf()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{ExposureMode, WhiteBalanceMode};
    use crate::frame::Frame;
    use async_trait::async_trait;
    use mlog_models::ColorChannel;
    use std::path::PathBuf;

    #[derive(Default)]
    struct FakeCamera {
        resolution: Option<Resolution>,
        fps: Option<u32>,
        recording: Option<PathBuf>,
        fail_start: bool,
        write_output: bool,
        calls: Vec<&'static str>,
    }

    #[async_trait]
    impl Camera for FakeCamera {
        fn configure_resolution(&mut self, resolution: Resolution) -> MediaResult<()> {
            self.resolution = Some(resolution);
            Ok(())
        }

        fn configure_framerate(&mut self, fps: u32) -> MediaResult<()> {
            self.fps = Some(fps);
            Ok(())
        }

        fn set_rotation(&mut self, _degrees: u16) -> MediaResult<()> {
            Ok(())
        }

        fn set_exposure_mode(&mut self, _mode: ExposureMode) {}

        fn set_white_balance_mode(&mut self, _mode: WhiteBalanceMode) {}

        async fn capture_still_frame(&mut self, _channel: ColorChannel) -> MediaResult<Frame> {
            Ok(Frame::filled(self.resolution.unwrap_or(Resolution::new(1, 1)), 0))
        }

        async fn start_recording(&mut self, path: &Path) -> MediaResult<()> {
            self.calls.push("start");
            if self.fail_start {
                return Err(MediaError::camera_failed("device busy", None, Some(1)));
            }
            self.recording = Some(path.to_path_buf());
            Ok(())
        }

        async fn stop_recording(&mut self) -> MediaResult<()> {
            self.calls.push("stop");
            let path = self.recording.take().ok_or(MediaError::NotRecording)?;
            if self.write_output {
                tokio::fs::write(&path, b"h264").await?;
            }
            Ok(())
        }

        async fn close(&mut self) -> MediaResult<()> {
            Ok(())
        }
    }

    fn recorder() -> Recorder {
        Recorder::new(RecordingSettings {
            resolution: Resolution::new(640, 480),
            fps: 10,
            duration: Duration::from_secs(10),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_configures_and_writes_clip() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("clip.h264");
        let mut camera = FakeCamera {
            write_output: true,
            ..Default::default()
        };

        let started = tokio::time::Instant::now();
        recorder().record(&mut camera, &output).await.unwrap();

        assert!(started.elapsed() >= Duration::from_secs(10));
        assert_eq!(camera.resolution, Some(Resolution::new(640, 480)));
        assert_eq!(camera.fps, Some(10));
        assert_eq!(camera.calls, vec!["start", "stop"]);
        assert!(output.exists());
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_fails_when_camera_busy() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FakeCamera {
            fail_start: true,
            ..Default::default()
        };

        let err = recorder()
            .record(&mut camera, &dir.path().join("clip.h264"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::CameraFailed { .. }));
        assert_eq!(camera.calls, vec!["start"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_record_requires_output_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FakeCamera::default();

        let err = recorder()
            .record(&mut camera, &dir.path().join("clip.h264"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaError::RecordingMissing(_)));
    }
}
