use async_trait::async_trait;

use crate::error::HistoryError;

/// A stored history file as known to its backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    /// Backend identifier (Drive file id, or the local path).
    pub id: String,
    pub name: String,
    pub mime_type: Option<String>,
}

/// Get/put access to named history files.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Human-readable location used in logs, e.g. `drive folder 1cSW…`.
    fn describe(&self) -> String;

    /// Looks up a file by exact name. `Ok(None)` means it does not exist yet.
    async fn find_by_name(&self, name: &str) -> Result<Option<FileHandle>, HistoryError>;

    async fn download(&self, file: &FileHandle) -> Result<Vec<u8>, HistoryError>;

    /// Replaces the content of `existing`, or creates `name` when `None`.
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        existing: Option<&FileHandle>,
    ) -> Result<FileHandle, HistoryError>;
}
