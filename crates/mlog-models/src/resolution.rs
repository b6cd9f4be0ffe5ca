//! Frame resolution and color channel definitions.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Total number of pixels in one frame.
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Error parsing a resolution or channel string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("expected WIDTHxHEIGHT, got '{0}'")]
    InvalidFormat(String),

    #[error("resolution must be non-zero, got '{0}'")]
    Zero(String),

    #[error("unknown color channel: {0}")]
    UnknownChannel(String),
}

impl FromStr for Resolution {
    type Err = ResolutionError;

    /// Parses `128x96` or `128,96`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (w, h) = trimmed
            .split_once(['x', 'X', ','])
            .ok_or_else(|| ResolutionError::InvalidFormat(s.to_string()))?;

        let width: u32 = w
            .trim()
            .parse()
            .map_err(|_| ResolutionError::InvalidFormat(s.to_string()))?;
        let height: u32 = h
            .trim()
            .parse()
            .map_err(|_| ResolutionError::InvalidFormat(s.to_string()))?;

        if width == 0 || height == 0 {
            return Err(ResolutionError::Zero(s.to_string()));
        }

        Ok(Self { width, height })
    }
}

/// Color channel extracted from an RGB still for change detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ColorChannel {
    #[default]
    Red,
    Green,
    Blue,
}

impl ColorChannel {
    /// Byte offset of this channel inside an RGB triple.
    pub fn rgb_offset(&self) -> usize {
        match self {
            ColorChannel::Red => 0,
            ColorChannel::Green => 1,
            ColorChannel::Blue => 2,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorChannel::Red => "red",
            ColorChannel::Green => "green",
            ColorChannel::Blue => "blue",
        }
    }
}

impl fmt::Display for ColorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ColorChannel {
    type Err = ResolutionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "red" | "r" => Ok(ColorChannel::Red),
            "green" | "g" => Ok(ColorChannel::Green),
            "blue" | "b" => Ok(ColorChannel::Blue),
            other => Err(ResolutionError::UnknownChannel(other.to_string())),
        }
    }
}
