//! Google Drive v3 backend for history files.
//!
//! Authenticates with a bearer access token obtained out of band. Files
//! are looked up by name inside one folder; Google Sheets documents are
//! exported as CSV, anything else is downloaded as stored.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::error::HistoryError;
use crate::retry::retry_with_backoff;
use crate::store::{FileHandle, HistoryStore};

const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";
const CSV_MIME: &str = "text/csv";
const FILE_FIELDS: &str = "id,name,mimeType";

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
    name: String,
    #[serde(rename = "mimeType")]
    mime_type: Option<String>,
}

impl From<DriveFile> for FileHandle {
    fn from(file: DriveFile) -> Self {
        Self {
            id: file.id,
            name: file.name,
            mime_type: file.mime_type,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

pub struct DriveStore {
    client: Client,
    base_url: Url,
    access_token: String,
    folder_id: String,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl DriveStore {
    /// Creates a store for `folder_id` on the production Drive API.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Http`] if the HTTP client cannot be built.
    pub fn new(
        access_token: &str,
        folder_id: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, HistoryError> {
        Self::with_base_url(
            DEFAULT_BASE_URL,
            access_token,
            folder_id,
            max_retries,
            backoff_base_ms,
        )
    }

    /// Creates a store against a custom API root (for wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Http`] if the HTTP client cannot be built, or
    /// [`HistoryError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        access_token: &str,
        folder_id: &str,
        max_retries: u32,
        backoff_base_ms: u64,
    ) -> Result<Self, HistoryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("shelfwatch/0.1 (history-sync)")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| HistoryError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            client,
            base_url,
            access_token: access_token.to_owned(),
            folder_id: folder_id.to_owned(),
            max_retries,
            backoff_base_ms,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base_url.clone();
        let prefix = self.base_url.path().trim_end_matches('/');
        url.set_path(&format!("{prefix}/{}", path.trim_start_matches('/')));
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        url
    }

    /// Sends the request built by `build`, retrying transient failures, and
    /// maps non-2xx statuses to typed errors.
    async fn execute<F>(&self, build: F) -> Result<Response, HistoryError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let request = build(&self.client).bearer_auth(&self.access_token);
            async move {
                let response = request.send().await?;
                check_status(response)
            }
        })
        .await
    }

    async fn execute_json<T, F>(&self, context: &str, build: F) -> Result<T, HistoryError>
    where
        T: DeserializeOwned,
        F: Fn(&Client) -> RequestBuilder,
    {
        let body = self.execute(build).await?.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| HistoryError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }

    async fn mime_type_of(&self, file: &FileHandle) -> Result<Option<String>, HistoryError> {
        if file.mime_type.is_some() {
            return Ok(file.mime_type.clone());
        }
        let url = self.endpoint(
            &format!("drive/v3/files/{}", file.id),
            &[("fields", FILE_FIELDS)],
        );
        let meta: DriveFile = self
            .execute_json(&format!("files.get({})", file.id), |c| c.get(url.clone()))
            .await?;
        Ok(meta.mime_type)
    }
}

#[async_trait]
impl HistoryStore for DriveStore {
    fn describe(&self) -> String {
        format!("drive folder {}", self.folder_id)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<FileHandle>, HistoryError> {
        let query = format!(
            "name = '{}' and '{}' in parents and trashed = false",
            escape_query_literal(name),
            escape_query_literal(&self.folder_id)
        );
        let url = self.endpoint(
            "drive/v3/files",
            &[
                ("q", query.as_str()),
                ("fields", "files(id,name,mimeType)"),
                ("spaces", "drive"),
                ("pageSize", "10"),
            ],
        );

        let list: DriveFileList = self
            .execute_json(&format!("files.list({name})"), |c| c.get(url.clone()))
            .await?;
        let found = list.files.into_iter().next().map(FileHandle::from);
        debug!(name, found = found.is_some(), "drive lookup");
        Ok(found)
    }

    async fn download(&self, file: &FileHandle) -> Result<Vec<u8>, HistoryError> {
        let mime_type = self.mime_type_of(file).await?;
        let url = if mime_type.as_deref() == Some(SPREADSHEET_MIME) {
            debug!(file_id = %file.id, "exporting spreadsheet as CSV");
            self.endpoint(
                &format!("drive/v3/files/{}/export", file.id),
                &[("mimeType", CSV_MIME)],
            )
        } else {
            self.endpoint(
                &format!("drive/v3/files/{}", file.id),
                &[("alt", "media")],
            )
        };

        let bytes = self.execute(|c| c.get(url.clone())).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        existing: Option<&FileHandle>,
    ) -> Result<FileHandle, HistoryError> {
        if let Some(file) = existing {
            let url = self.endpoint(
                &format!("upload/drive/v3/files/{}", file.id),
                &[("uploadType", "media"), ("fields", FILE_FIELDS)],
            );
            let updated: DriveFile = self
                .execute_json(&format!("files.update({})", file.id), |c| {
                    c.patch(url.clone())
                        .header(reqwest::header::CONTENT_TYPE, CSV_MIME)
                        .body(bytes.clone())
                })
                .await?;
            info!(file_id = %updated.id, name, "drive history updated");
            return Ok(updated.into());
        }

        let url = self.endpoint(
            "upload/drive/v3/files",
            &[("uploadType", "multipart"), ("fields", FILE_FIELDS)],
        );
        let boundary = format!("shelfwatch-{:016x}", rand::random::<u64>());
        let metadata = json!({
            "name": name,
            "parents": [self.folder_id],
            "mimeType": CSV_MIME,
        });
        let body = multipart_related(&boundary, &metadata, &bytes);
        let content_type = format!("multipart/related; boundary={boundary}");

        let created: DriveFile = self
            .execute_json(&format!("files.create({name})"), |c| {
                c.post(url.clone())
                    .header(reqwest::header::CONTENT_TYPE, content_type.as_str())
                    .body(body.clone())
            })
            .await?;
        info!(file_id = %created.id, name, "drive history created");
        Ok(created.into())
    }
}

fn check_status(response: Response) -> Result<Response, HistoryError> {
    let status = response.status();
    let url = response.url().to_string();

    if status == StatusCode::TOO_MANY_REQUESTS {
        let retry_after_secs = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(60);
        return Err(HistoryError::RateLimited {
            url,
            retry_after_secs,
        });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(HistoryError::NotFound { url });
    }
    if !status.is_success() {
        return Err(HistoryError::UnexpectedStatus {
            status: status.as_u16(),
            url,
        });
    }
    Ok(response)
}

/// Escapes a value for a single-quoted literal in a Drive `q` expression.
fn escape_query_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

fn multipart_related(boundary: &str, metadata: &serde_json::Value, content: &[u8]) -> Vec<u8> {
    let head = format!(
        "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
         --{boundary}\r\nContent-Type: {CSV_MIME}\r\n\r\n"
    );
    let tail = format!("\r\n--{boundary}--\r\n");

    let mut body = Vec::with_capacity(head.len() + content.len() + tail.len());
    body.extend_from_slice(head.as_bytes());
    body.extend_from_slice(content);
    body.extend_from_slice(tail.as_bytes());
    body
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_quotes_in_query_literals() {
        assert_eq!(escape_query_literal("o'neil.csv"), "o\\'neil.csv");
        assert_eq!(escape_query_literal("a\\b"), "a\\\\b");
    }

    #[test]
    fn multipart_body_wraps_metadata_and_content() {
        let body = multipart_related("XYZ", &json!({"name": "a.csv"}), b"id\n1\n");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--XYZ\r\nContent-Type: application/json"));
        assert!(text.contains("{\"name\":\"a.csv\"}"));
        assert!(text.contains("Content-Type: text/csv\r\n\r\nid\n1\n\r\n--XYZ--\r\n"));
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let store =
            DriveStore::with_base_url("http://127.0.0.1:9/mock/", "t", "folder", 0, 0).unwrap();
        let url = store.endpoint("drive/v3/files", &[("alt", "media")]);
        assert_eq!(url.as_str(), "http://127.0.0.1:9/mock/drive/v3/files?alt=media");
    }
}
