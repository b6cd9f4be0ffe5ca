//! Google Drive v3 REST client.
//!
//! Implements `RemoteStorage` with plain `reqwest` calls:
//! - Bearer tokens from a `TokenSource`, refreshed once on 401
//! - Folder lookup via the `files.list` query language
//! - Multipart/related uploads (metadata + media in one request)
//! - Per-operation spans and request metrics
//!
//! There is no request timeout, only a connect timeout. A stalled transfer
//! blocks the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::{BufMut, Bytes, BytesMut};
use gcp_auth::{CustomServiceAccount, TokenProvider};
use mlog_models::{FileId, FolderId};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, info_span, Instrument};

use crate::error::{StorageError, StorageResult};
use crate::metrics::record_request;
use crate::remote::{RemoteFolder, RemoteStorage};
use crate::token_cache::{StaticToken, TokenCache, TokenSource};

const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

// =============================================================================
// Configuration
// =============================================================================

/// Drive client configuration.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    /// Metadata API base URL
    pub api_base: String,
    /// Media upload API base URL
    pub upload_base: String,
    /// Folder that day folders are created under (Drive root when unset)
    pub parent_folder_id: Option<String>,
    /// Service-account JSON key path
    pub credentials_path: Option<PathBuf>,
    /// Pre-minted access token, bypasses `gcp_auth`
    pub access_token: Option<String>,
    /// Connect timeout
    pub connect_timeout: Duration,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            api_base: "https://www.googleapis.com/drive/v3".to_string(),
            upload_base: "https://www.googleapis.com/upload/drive/v3".to_string(),
            parent_folder_id: None,
            credentials_path: None,
            access_token: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl DriveConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let connect_timeout_secs: u64 = std::env::var("MOTIONLOG_DRIVE_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(defaults.connect_timeout.as_secs());

        Self {
            api_base: non_empty("MOTIONLOG_DRIVE_API_BASE").unwrap_or(defaults.api_base),
            upload_base: non_empty("MOTIONLOG_DRIVE_UPLOAD_BASE").unwrap_or(defaults.upload_base),
            parent_folder_id: non_empty("MOTIONLOG_DRIVE_PARENT_ID"),
            credentials_path: non_empty("MOTIONLOG_DRIVE_CREDENTIALS").map(PathBuf::from),
            access_token: non_empty("MOTIONLOG_DRIVE_ACCESS_TOKEN"),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
        }
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    #[serde(default)]
    name: String,
}

// =============================================================================
// Client
// =============================================================================

/// Google Drive REST API client.
#[derive(Clone)]
pub struct DriveClient {
    http: Client,
    config: DriveConfig,
    tokens: Arc<dyn TokenSource>,
}

impl DriveClient {
    /// Create a client with an explicit token source.
    pub fn new(config: DriveConfig, tokens: Arc<dyn TokenSource>) -> StorageResult<Self> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!("motionlog/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| StorageError::config_error(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            config,
            tokens,
        })
    }

    /// Create from environment variables.
    ///
    /// Token source precedence: `MOTIONLOG_DRIVE_ACCESS_TOKEN`, then the
    /// service account at `MOTIONLOG_DRIVE_CREDENTIALS`, then the default
    /// `gcp_auth` provider chain.
    pub async fn from_env() -> StorageResult<Self> {
        let config = DriveConfig::from_env();
        let tokens = Self::create_token_source(&config).await?;
        Self::new(config, tokens)
    }

    async fn create_token_source(config: &DriveConfig) -> StorageResult<Arc<dyn TokenSource>> {
        if let Some(token) = &config.access_token {
            debug!("Using static Drive access token");
            return Ok(Arc::new(StaticToken(token.clone())));
        }

        let provider: Arc<dyn TokenProvider> = match &config.credentials_path {
            Some(path) => {
                let account = CustomServiceAccount::from_file(path).map_err(|e| {
                    StorageError::auth_error(format!(
                        "Failed to load service account {}: {}",
                        path.display(),
                        e
                    ))
                })?;
                Arc::new(account)
            }
            None => gcp_auth::provider().await.map_err(|e| {
                StorageError::auth_error(format!(
                    "No Google credentials found (set MOTIONLOG_DRIVE_CREDENTIALS): {}",
                    e
                ))
            })?,
        };

        Ok(Arc::new(TokenCache::new(provider)))
    }

    pub fn config(&self) -> &DriveConfig {
        &self.config
    }

    /// Fetch a token once to prove the credentials work.
    pub async fn authenticate(&self) -> StorageResult<()> {
        self.tokens.access_token().await.map_err(|e| match e {
            StorageError::AuthError(_) => e,
            other => StorageError::auth_error(other.to_string()),
        })?;
        info!("Authenticated with Google Drive");
        Ok(())
    }

    /// Send a request built by `build`, refreshing the token once on 401.
    ///
    /// Returns the response only for a success status.
    async fn send_authorized<F>(&self, operation: &'static str, build: F) -> StorageResult<Response>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let span = info_span!("drive_request", operation = %operation);

        async {
            let start = Instant::now();

            let result = async {
                let token = self.tokens.access_token().await?;
                let mut response = build(&self.http).bearer_auth(&token).send().await?;

                if response.status() == StatusCode::UNAUTHORIZED {
                    debug!("Drive returned 401, refreshing token");
                    self.tokens.invalidate().await;
                    let token = self.tokens.access_token().await?;
                    response = build(&self.http).bearer_auth(&token).send().await?;
                }

                if response.status().is_success() {
                    Ok(response)
                } else {
                    Err(Self::handle_error_response(operation, response).await)
                }
            }
            .await;

            let status = match &result {
                Ok(response) => response.status().as_u16(),
                Err(StorageError::RequestFailed { status, .. }) => *status,
                Err(StorageError::AuthError(_)) => 401,
                Err(StorageError::NotFound(_)) => 404,
                Err(_) => 0,
            };
            record_request(operation, status, start.elapsed().as_secs_f64());

            result
        }
        .instrument(span)
        .await
    }

    async fn handle_error_response(operation: &str, response: Response) -> StorageError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        StorageError::from_http_status(status.as_u16(), format!("{} failed: {}", operation, body))
    }

    /// `files.list` query for folders named `name`.
    fn folder_query(&self, name: &str) -> String {
        let mut query = format!(
            "name = '{}' and mimeType = '{}' and trashed = false",
            escape_query_value(name),
            FOLDER_MIME_TYPE
        );
        if let Some(parent) = &self.config.parent_folder_id {
            query.push_str(&format!(" and '{}' in parents", escape_query_value(parent)));
        }
        query
    }
}

/// Escape a literal for the Drive query language.
fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Build a multipart/related body: JSON metadata then the media bytes.
///
/// Clones of the returned buffer share one allocation.
fn multipart_related_body(boundary: &str, metadata: &serde_json::Value, mime_type: &str, media: &[u8]) -> Bytes {
    let mut body = BytesMut::with_capacity(media.len() + 512);
    body.put_slice(format!("--{}\r\n", boundary).as_bytes());
    body.put_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.put_slice(metadata.to_string().as_bytes());
    body.put_slice(format!("\r\n--{}\r\n", boundary).as_bytes());
    body.put_slice(format!("Content-Type: {}\r\n\r\n", mime_type).as_bytes());
    body.put_slice(media);
    body.put_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body.freeze()
}

#[async_trait]
impl RemoteStorage for DriveClient {
    async fn authenticate(&self) -> StorageResult<()> {
        DriveClient::authenticate(self).await
    }

    async fn list_folders_by_name(&self, name: &str) -> StorageResult<Vec<RemoteFolder>> {
        let url = format!("{}/files", self.config.api_base);
        let query = self.folder_query(name);

        let response = self
            .send_authorized("list_folders", |http| {
                http.get(&url).query(&[
                    ("q", query.as_str()),
                    ("fields", "files(id,name)"),
                    ("spaces", "drive"),
                ])
            })
            .await?;

        let list: FileList = response.json().await?;
        Ok(list
            .files
            .into_iter()
            .map(|f| RemoteFolder {
                id: FolderId::from(f.id),
                name: f.name,
            })
            .collect())
    }

    async fn create_folder(&self, name: &str) -> StorageResult<FolderId> {
        let url = format!("{}/files", self.config.api_base);
        let mut metadata = json!({
            "name": name,
            "mimeType": FOLDER_MIME_TYPE,
        });
        if let Some(parent) = &self.config.parent_folder_id {
            metadata["parents"] = json!([parent]);
        }

        let response = self
            .send_authorized("create_folder", |http| {
                http.post(&url).query(&[("fields", "id")]).json(&metadata)
            })
            .await?;

        let file: DriveFile = response.json().await?;
        debug!(folder = %name, id = %file.id, "Created Drive folder");
        Ok(FolderId::from(file.id))
    }

    async fn upload_file(&self, local_path: &Path, parent: &FolderId, mime_type: &str) -> StorageResult<FileId> {
        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("no file name in {}", local_path.display()),
                )
            })?
            .to_string();

        let media = tokio::fs::read(local_path).await?;
        let metadata = json!({
            "name": file_name,
            "parents": [parent.as_str()],
        });

        let boundary = format!(
            "motionlog-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
        );
        let body = multipart_related_body(&boundary, &metadata, mime_type, &media);
        let content_type = format!("multipart/related; boundary={}", boundary);
        let url = format!("{}/files", self.config.upload_base);

        let response = self
            .send_authorized("upload_file", |http| {
                http.post(&url)
                    .query(&[("uploadType", "multipart"), ("fields", "id")])
                    .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                    .body(body.clone())
            })
            .await?;

        let file: DriveFile = response.json().await?;
        debug!(file = %file_name, id = %file.id, bytes = media.len(), "Uploaded clip");
        Ok(FileId::from(file.id))
    }

    async fn delete_by_id(&self, id: &str) -> StorageResult<()> {
        let url = format!("{}/files/{}", self.config.api_base, id);
        self.send_authorized("delete", |http| http.delete(&url)).await?;
        Ok(())
    }
}

// =============================================================================
// Tests
// =============================================================================
