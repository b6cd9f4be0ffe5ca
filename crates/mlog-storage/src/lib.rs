//! Remote storage for recorded clips.
//!
//! This crate provides:
//! - The `RemoteStorage` collaborator trait
//! - A Google Drive v3 REST client with cached OAuth tokens
//! - Day-folder indexing (lookup, create, delete)
//! - Clip upload into a day folder

pub mod drive;
pub mod error;
pub mod indexer;
pub mod metrics;
pub mod remote;
pub mod token_cache;

pub use drive::{DriveClient, DriveConfig};
pub use error::{StorageError, StorageResult};
pub use indexer::{StorageIndexer, Uploader};
pub use remote::{RemoteFolder, RemoteStorage};
pub use token_cache::{StaticToken, TokenCache, TokenSource, DRIVE_SCOPE};
