//! Frame sampling from the camera.

use async_trait::async_trait;
use mlog_models::{ColorChannel, Resolution};

use crate::camera::Camera;
use crate::error::MediaResult;
use crate::frame::Frame;

/// Something that yields frames on demand.
#[async_trait]
pub trait FrameSource: Send {
    async fn next_frame(&mut self) -> MediaResult<Frame>;
}

/// Capture one still at `resolution` and keep a single channel.
pub async fn sample_frame<C: Camera + ?Sized>(
    camera: &mut C,
    resolution: Resolution,
    channel: ColorChannel,
) -> MediaResult<Frame> {
    camera.configure_resolution(resolution)?;
    camera.capture_still_frame(channel).await
}

/// Frame source that borrows the camera for the duration of a detection wait.
pub struct CameraSampler<'a, C: Camera + ?Sized> {
    camera: &'a mut C,
    resolution: Resolution,
    channel: ColorChannel,
}

impl<'a, C: Camera + ?Sized> CameraSampler<'a, C> {
    pub fn new(camera: &'a mut C, resolution: Resolution, channel: ColorChannel) -> Self {
        Self {
            camera,
            resolution,
            channel,
        }
    }
}

#[async_trait]
impl<'a, C: Camera + ?Sized> FrameSource for CameraSampler<'a, C> {
    async fn next_frame(&mut self) -> MediaResult<Frame> {
        sample_frame(&mut *self.camera, self.resolution, self.channel).await
    }
}
