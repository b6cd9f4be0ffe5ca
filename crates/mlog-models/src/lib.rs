//! Shared data models for motionlog.
//!
//! This crate provides Serde-serializable types for:
//! - Frame resolutions and color channels
//! - Day folders and clip names derived from detection time
//! - Remote folder and file identifiers
//! - Clip records tracked through a pipeline cycle
//! - The fault taxonomy shared by all crates

pub mod clip;
pub mod fault;
pub mod resolution;

// Re-export common types
pub use clip::{ClipName, ClipRecord, FileId, FolderId, FolderName, CLIP_EXTENSION, CLIP_MIME_TYPE};
pub use fault::FaultKind;
pub use resolution::{ColorChannel, Resolution, ResolutionError};
