use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::HistoryError;
use crate::store::{FileHandle, HistoryStore};

/// History files kept as plain CSV files in one directory.
#[derive(Debug, Clone)]
pub struct LocalDirStore {
    dir: PathBuf,
}

impl LocalDirStore {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn io_error(path: &Path, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: path.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl HistoryStore for LocalDirStore {
    fn describe(&self) -> String {
        format!("local directory {}", self.dir.display())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<FileHandle>, HistoryError> {
        let path = self.dir.join(name);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(Some(FileHandle {
                id: path.display().to_string(),
                name: name.to_owned(),
                mime_type: Some("text/csv".to_owned()),
            })),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Self::io_error(&path, e)),
        }
    }

    async fn download(&self, file: &FileHandle) -> Result<Vec<u8>, HistoryError> {
        let path = PathBuf::from(&file.id);
        tokio::fs::read(&path)
            .await
            .map_err(|e| Self::io_error(&path, e))
    }

    /// Writes to a sibling temp file and renames it over the target, so a
    /// crash mid-write leaves the previous history intact.
    async fn upload(
        &self,
        name: &str,
        bytes: Vec<u8>,
        existing: Option<&FileHandle>,
    ) -> Result<FileHandle, HistoryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| Self::io_error(&self.dir, e))?;

        let target = existing.map_or_else(|| self.dir.join(name), |f| PathBuf::from(&f.id));
        let tmp = target.with_extension("csv.tmp");
        tokio::fs::write(&tmp, &bytes)
            .await
            .map_err(|e| Self::io_error(&tmp, e))?;
        tokio::fs::rename(&tmp, &target)
            .await
            .map_err(|e| Self::io_error(&target, e))?;

        Ok(FileHandle {
            id: target.display().to_string(),
            name: name.to_owned(),
            mime_type: Some("text/csv".to_owned()),
        })
    }
}
