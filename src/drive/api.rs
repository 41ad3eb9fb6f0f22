//! Remote storage service boundary
//!
//! `DriveApi` is the request/response seam the engines call through; the
//! production implementation `DriveHub` talks to the Google Drive API v3
//! over reqwest. Everything above this module treats the service as four
//! operations: list a page, create an item (with or without content),
//! delete an item, fetch an item's metadata.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Deserialize;
use tracing::debug;

use crate::auth::AccessToken;

use super::retry::{send_with_retry, RetryPolicy};
use super::types::{DriveError, ItemPage};

pub const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
pub const UPLOAD_API_BASE: &str = "https://www.googleapis.com/upload/drive/v3";

/// Field projection for listing calls; matches the attributes `DriveItem`
/// carries, nothing more.
const LIST_FIELDS: &str = "nextPageToken,files(id,name,mimeType,modifiedTime,size,parents)";

const MULTIPART_BOUNDARY: &str = "drivesweep_boundary";

/// The four remote operations the engines rely on. Implemented by
/// [`DriveHub`] in production and by scripted fakes in tests.
#[async_trait]
pub trait DriveApi: Send + Sync {
    /// Fetch one page of items matching `query`, continuing from
    /// `page_token` when present.
    async fn list_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ItemPage, DriveError>;

    /// Upload `content` as a new file under `parent_id`; returns the new
    /// item's id.
    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<String, DriveError>;

    /// Create an empty folder under `parent_id`; returns the new folder's id.
    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, DriveError>;

    /// Delete one item; returns the raw response body (empty on success).
    async fn delete_item(&self, file_id: &str) -> Result<String, DriveError>;

    /// Fetch the full metadata object for one item.
    async fn get_metadata(&self, file_id: &str) -> Result<serde_json::Value, DriveError>;
}

/// Drive API v3 client bound to one access token.
pub struct DriveHub {
    client: reqwest::Client,
    token: AccessToken,
    retry: RetryPolicy,
}

#[derive(Debug, Deserialize)]
struct CreatedId {
    id: String,
}

impl DriveHub {
    pub fn new(token: AccessToken) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::Response, DriveError> {
        let response = send_with_retry(builder, &self.retry).await?;
        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(DriveError::Credentials(
                "access token rejected by the Drive API".to_string(),
            ));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(DriveError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl DriveApi for DriveHub {
    async fn list_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<&str>,
    ) -> Result<ItemPage, DriveError> {
        let mut url = format!(
            "{DRIVE_API_BASE}/files?q={}&spaces=drive&pageSize={page_size}&fields={LIST_FIELDS}",
            urlencoding::encode(query)
        );
        if let Some(token) = page_token {
            url.push_str(&format!("&pageToken={}", urlencoding::encode(token)));
        }
        debug!("GET {url}");

        let response = self
            .send(self.client.get(&url).header(AUTHORIZATION, self.token.bearer()))
            .await?;
        response
            .json::<ItemPage>()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))
    }

    async fn create_file(
        &self,
        name: &str,
        parent_id: &str,
        mime_type: &str,
        content: Vec<u8>,
    ) -> Result<String, DriveError> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        });

        // multipart/related: metadata part, then the content part
        let mut body = Vec::with_capacity(content.len() + 512);
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
        body.extend_from_slice(metadata.to_string().as_bytes());
        body.extend_from_slice(b"\r\n");
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
        body.extend_from_slice(&content);
        body.extend_from_slice(format!("\r\n--{MULTIPART_BOUNDARY}--").as_bytes());

        let url = format!("{UPLOAD_API_BASE}/files?uploadType=multipart&fields=id");
        let response = self
            .send(
                self.client
                    .post(&url)
                    .header(AUTHORIZATION, self.token.bearer())
                    .header(
                        CONTENT_TYPE,
                        format!("multipart/related; boundary={MULTIPART_BOUNDARY}"),
                    )
                    .body(body),
            )
            .await?;

        let created: CreatedId = response
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    async fn create_folder(&self, name: &str, parent_id: &str) -> Result<String, DriveError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": super::kinds::FOLDER_MIME,
            "parents": [parent_id],
        });

        let url = format!("{DRIVE_API_BASE}/files?fields=id");
        let response = self
            .send(
                self.client
                    .post(&url)
                    .header(AUTHORIZATION, self.token.bearer())
                    .header(CONTENT_TYPE, "application/json")
                    .body(metadata.to_string()),
            )
            .await?;

        let created: CreatedId = response
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))?;
        Ok(created.id)
    }

    async fn delete_item(&self, file_id: &str) -> Result<String, DriveError> {
        let url = format!("{DRIVE_API_BASE}/files/{file_id}");
        let response = self
            .send(self.client.delete(&url).header(AUTHORIZATION, self.token.bearer()))
            .await?;
        // success body is empty; return it verbatim as the response token
        Ok(response.text().await.unwrap_or_default())
    }

    async fn get_metadata(&self, file_id: &str) -> Result<serde_json::Value, DriveError> {
        let url = format!("{DRIVE_API_BASE}/files/{file_id}");
        let response = self
            .send(self.client.get(&url).header(AUTHORIZATION, self.token.bearer()))
            .await?;
        response
            .json()
            .await
            .map_err(|e| DriveError::Parse(e.to_string()))
    }
}
