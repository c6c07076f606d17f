//! HTTP implementation of [`RemoteStore`] against a Drive-style v3 REST API.

use crate::error::{RemoteError, Result};
use crate::store::{ByteStream, ListPage, RemoteStore, MAX_PAGE_SIZE};
use async_trait::async_trait;
use futures_util::StreamExt;
use mirror_core::RemoteNode;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

/// Default API endpoint for the hosted remote store.
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com/drive/v3";

/// Field projection requested from listing calls. Keeping this stable is what
/// makes snapshots comparable across runs.
const LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, modifiedTime)";

/// Supplies a bearer access token for each request.
///
/// Credential acquisition (service accounts, refresh flows) lives behind this
/// seam and is not part of the sync core.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn access_token(&self) -> Result<String>;
}

/// Token provider backed by a fixed, externally supplied token.
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn access_token(&self) -> Result<String> {
        Ok(self.token.clone())
    }
}

/// Remote store client over HTTP.
pub struct DriveClient {
    http: Client,
    base_url: String,
    tokens: Arc<dyn TokenProvider>,
}

impl DriveClient {
    pub fn new(tokens: Arc<dyn TokenProvider>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, tokens)
    }

    /// Client against a non-default endpoint (tests, private deployments).
    pub fn with_base_url(base_url: impl Into<String>, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    async fn get_stream(&self, url: String, query: &[(&str, &str)]) -> Result<ByteStream> {
        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(&url)
            .query(query)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(RemoteError::from));
        Ok(Box::pin(stream))
    }
}

/// Wire shape of one listing page.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileListResponse {
    next_page_token: Option<String>,
    #[serde(default)]
    files: Vec<FileResource>,
}

/// Wire shape of one file resource. `size` arrives as a decimal string.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FileResource {
    id: String,
    name: String,
    mime_type: String,
    size: Option<String>,
    modified_time: Option<String>,
}

impl From<FileResource> for RemoteNode {
    fn from(file: FileResource) -> Self {
        RemoteNode {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
            size: file.size.and_then(|s| s.parse().ok()),
            modified_at: file.modified_time.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl RemoteStore for DriveClient {
    async fn check_access(&self, id: &str) -> Result<()> {
        let url = format!("{}/files/{}", self.base_url, id);
        debug!(url = %url, id = %id, "Checking remote access");

        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(&url)
            .query(&[("fields", "id")])
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(RemoteError::Access {
                folder_id: id.to_string(),
                message: format!("status {status}: {message}"),
            })
        }
    }

    async fn list_page(&self, parent_id: &str, page_token: Option<&str>) -> Result<ListPage> {
        let url = format!("{}/files", self.base_url);
        let query = format!("'{parent_id}' in parents and trashed = false");
        let page_size = MAX_PAGE_SIZE.to_string();

        let mut params = vec![
            ("q", query.as_str()),
            ("fields", LIST_FIELDS),
            ("pageSize", page_size.as_str()),
        ];
        if let Some(token) = page_token {
            params.push(("pageToken", token));
        }

        debug!(parent_id = %parent_id, page_token = ?page_token, "Listing folder page");

        let token = self.tokens.access_token().await?;
        let response = self
            .http
            .get(&url)
            .query(&params)
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Server {
                status: status.as_u16(),
                message,
            });
        }

        let list: FileListResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Parse(format!("listing response: {e}")))?;

        Ok(ListPage {
            items: list.files.into_iter().map(RemoteNode::from).collect(),
            next_page_token: list.next_page_token,
        })
    }

    async fn export(&self, id: &str, target_mime: &str) -> Result<ByteStream> {
        let url = format!("{}/files/{}/export", self.base_url, id);
        debug!(id = %id, target_mime = %target_mime, "Exporting virtual document");
        self.get_stream(url, &[("mimeType", target_mime)]).await
    }

    async fn download(&self, id: &str) -> Result<ByteStream> {
        let url = format!("{}/files/{}", self.base_url, id);
        debug!(id = %id, "Downloading file content");
        self.get_stream(url, &[("alt", "media")]).await
    }
}
