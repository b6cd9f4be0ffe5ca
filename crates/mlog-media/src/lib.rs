//! Camera access, motion detection and clip recording.
//!
//! This crate provides:
//! - The `Camera` collaborator trait and an `rpicam-*` backed implementation
//! - Single-channel frame sampling
//! - Frame-differencing motion detection with early-exit scanning
//! - Fixed-duration clip recording

pub mod camera;
pub mod command;
pub mod error;
pub mod frame;
pub mod motion;
pub mod recorder;
pub mod rpicam;
pub mod sampler;

pub use camera::{Camera, ExposureMode, WhiteBalanceMode};
pub use command::{check_binary, RpicamCommand};
pub use error::{MediaError, MediaResult};
pub use frame::Frame;
pub use motion::{count_changed_pixels, frames_differ, MotionDetector, MotionEvent, MotionSettings};
pub use recorder::{Recorder, RecordingSettings};
pub use rpicam::{RpiCamera, RpiCameraConfig};
pub use sampler::{sample_frame, CameraSampler, FrameSource};
