//! Frame-differencing motion detection.
//!
//! Consecutive low-resolution stills are compared sample by sample. A sample
//! counts as changed when its intensity moved by more than the pixel
//! threshold, and motion is declared once more than `frame_sensitivity`
//! samples changed. The scan stops as soon as that count is passed, which
//! gives the same answer as a full-frame scan.
//!
//! A sensitivity at or above the frame's pixel count can never be exceeded,
//! so such a detector waits forever.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, trace};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::sampler::FrameSource;

/// Tuning for the detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionSettings {
    /// Samples per second
    pub frequency_hz: f64,
    /// Minimum per-pixel intensity change that counts (0-255)
    pub pixel_threshold: u8,
    /// Changed pixels a frame must exceed to count as motion
    pub frame_sensitivity: usize,
}

impl MotionSettings {
    pub fn new(frequency_hz: f64, pixel_threshold: u8, frame_sensitivity: usize) -> MediaResult<Self> {
        if !frequency_hz.is_finite() || frequency_hz <= 0.0 {
            return Err(MediaError::invalid_setting(format!(
                "sample frequency must be positive, got {}",
                frequency_hz
            )));
        }

        Ok(Self {
            frequency_hz,
            pixel_threshold,
            frame_sensitivity,
        })
    }

    /// Pause between two samples.
    pub fn interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frequency_hz)
    }
}

/// Result of a detection wait.
#[derive(Debug, Clone, PartialEq)]
pub struct MotionEvent {
    /// Wall-clock time the motion frame was evaluated
    pub detected_at: DateTime<Local>,
    /// Changed pixels counted before the scan stopped
    pub changed_pixels: usize,
    /// Frames compared against a reference during this wait
    pub samples: u64,
}

/// Count samples whose intensity changed by more than `threshold`.
///
/// With `stop_after = Some(limit)` the scan returns as soon as the count
/// exceeds `limit`. Both frames must have the same dimensions.
pub fn count_changed_pixels(old: &Frame, new: &Frame, threshold: u8, stop_after: Option<usize>) -> usize {
    let threshold = i16::from(threshold);
    let mut changed = 0usize;

    for (&a, &b) in old.pixels().iter().zip(new.pixels()) {
        if (i16::from(a) - i16::from(b)).abs() > threshold {
            changed += 1;
            if let Some(limit) = stop_after {
                if changed > limit {
                    break;
                }
            }
        }
    }

    changed
}

/// True when more than `sensitivity` samples changed by more than `threshold`.
pub fn frames_differ(old: &Frame, new: &Frame, threshold: u8, sensitivity: usize) -> MediaResult<bool> {
    if old.resolution() != new.resolution() {
        return Err(MediaError::FrameMismatch {
            expected: old.resolution(),
            actual: new.resolution(),
        });
    }

    Ok(count_changed_pixels(old, new, threshold, Some(sensitivity)) > sensitivity)
}

/// Blocking motion detector.
#[derive(Debug, Clone)]
pub struct MotionDetector {
    settings: MotionSettings,
}

impl MotionDetector {
    pub fn new(settings: MotionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &MotionSettings {
        &self.settings
    }

    /// Sample until motion is seen.
    ///
    /// Only returns early with an error when the frame source fails.
    pub async fn detect<S: FrameSource + ?Sized>(&self, source: &mut S) -> MediaResult<MotionEvent> {
        let interval = self.settings.interval();
        let threshold = self.settings.pixel_threshold;
        let sensitivity = self.settings.frame_sensitivity;

        let mut reference = source.next_frame().await?;
        let mut samples = 0u64;

        loop {
            tokio::time::sleep(interval).await;
            let current = source.next_frame().await?;
            samples += 1;

            if current.resolution() != reference.resolution() {
                return Err(MediaError::FrameMismatch {
                    expected: reference.resolution(),
                    actual: current.resolution(),
                });
            }

            let changed = count_changed_pixels(&reference, &current, threshold, Some(sensitivity));
            if changed > sensitivity {
                debug!(changed, samples, "Motion detected");
                return Ok(MotionEvent {
                    detected_at: Local::now(),
                    changed_pixels: changed,
                    samples,
                });
            }

            trace!(changed, samples, "No motion");
            reference = current;
        }
    }
}
