//! End-of-run history update: find, download, parse, reconcile, upload.

use shelfwatch_core::SchemaDrift;
use tracing::{info, warn};

use crate::error::HistoryError;
use crate::reconcile::{reconcile, ReconcileStats};
use crate::store::HistoryStore;
use crate::table::{read_history, Table};

#[derive(Debug, Clone)]
pub struct SyncReport {
    pub file_name: String,
    /// Backend id of the file written.
    pub file_id: String,
    /// `true` when no previous file existed and one was created.
    pub created: bool,
    /// `true` when a stored file existed but could not be parsed.
    pub history_discarded: bool,
    pub stats: ReconcileStats,
}

/// Merges `new` into the stored history file `file_name` and writes it back.
///
/// A missing or unparseable stored file is replaced by the new rows. A
/// store that cannot be reached, or a file that exists but cannot be
/// downloaded, is an error and nothing is written.
///
/// # Errors
///
/// Returns the [`HistoryError`] of the failing lookup, download, encoding,
/// or upload step.
pub async fn sync_history(
    store: &dyn HistoryStore,
    file_name: &str,
    new: &Table,
    drift: SchemaDrift,
) -> Result<SyncReport, HistoryError> {
    info!(store = %store.describe(), file = file_name, "updating history");

    let existing_file = store.find_by_name(file_name).await?;
    let mut history_discarded = false;

    let existing_table = match &existing_file {
        Some(file) => {
            let bytes = store.download(file).await?;
            let table = read_history(&bytes);
            if table.is_none() {
                warn!(file = file_name, "stored history is empty or corrupt; rewriting from this run");
                history_discarded = true;
            }
            table
        }
        None => {
            info!(file = file_name, "no stored history; creating it");
            None
        }
    };

    let merged = reconcile(existing_table.as_ref(), new, drift);
    let bytes = merged.table.to_csv_bytes()?;
    let written = store
        .upload(file_name, bytes, existing_file.as_ref())
        .await?;

    Ok(SyncReport {
        file_name: file_name.to_owned(),
        file_id: written.id,
        created: existing_file.is_none(),
        history_discarded,
        stats: merged.stats,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::store::FileHandle;
    use crate::table::parse_csv;

    /// In-memory store; `fail_download` simulates an unreachable file body.
    #[derive(Default)]
    struct MemoryStore {
        files: Mutex<HashMap<String, Vec<u8>>>,
        fail_download: bool,
    }

    impl MemoryStore {
        fn with_file(name: &str, content: &[u8]) -> Self {
            let store = Self::default();
            store
                .files
                .lock()
                .unwrap()
                .insert(name.to_owned(), content.to_vec());
            store
        }

        fn content(&self, name: &str) -> String {
            String::from_utf8(self.files.lock().unwrap()[name].clone()).unwrap()
        }
    }

    #[async_trait]
    impl HistoryStore for MemoryStore {
        fn describe(&self) -> String {
            "memory".to_owned()
        }

        async fn find_by_name(&self, name: &str) -> Result<Option<FileHandle>, HistoryError> {
            Ok(self.files.lock().unwrap().contains_key(name).then(|| FileHandle {
                id: name.to_owned(),
                name: name.to_owned(),
                mime_type: None,
            }))
        }

        async fn download(&self, file: &FileHandle) -> Result<Vec<u8>, HistoryError> {
            if self.fail_download {
                return Err(HistoryError::UnexpectedStatus {
                    status: 500,
                    url: file.id.clone(),
                });
            }
            Ok(self.files.lock().unwrap()[&file.id].clone())
        }

        async fn upload(
            &self,
            name: &str,
            bytes: Vec<u8>,
            _existing: Option<&FileHandle>,
        ) -> Result<FileHandle, HistoryError> {
            self.files.lock().unwrap().insert(name.to_owned(), bytes);
            Ok(FileHandle {
                id: name.to_owned(),
                name: name.to_owned(),
                mime_type: None,
            })
        }
    }

    fn batch() -> Table {
        parse_csv("fecha_extraccion,id,nombre\n2026-10-19 08:00:00,aaa,Kobo Sage\n").unwrap()
    }

    #[tokio::test]
    async fn creates_history_when_absent() {
        let store = MemoryStore::default();
        let report = sync_history(&store, "h.csv", &batch(), SchemaDrift::Intersection)
            .await
            .unwrap();
        assert!(report.created);
        assert_eq!(report.stats.final_rows, 1);
        assert_eq!(
            store.content("h.csv"),
            "fecha_extraccion,id,nombre\n2026-10-19 08:00:00,aaa,Kobo Sage\n"
        );
    }

    #[tokio::test]
    async fn appends_to_existing_history() {
        let store = MemoryStore::with_file(
            "h.csv",
            b"fecha_extraccion;id;nombre\n2026-10-18 08:00:00;aaa;Kobo Sage\n",
        );
        let report = sync_history(&store, "h.csv", &batch(), SchemaDrift::Intersection)
            .await
            .unwrap();
        assert!(!report.created);
        assert_eq!(report.stats.existing_rows, 1);
        assert_eq!(report.stats.final_rows, 2);
        assert!(store.content("h.csv").ends_with("2026-10-19 08:00:00,aaa,Kobo Sage\n"));
    }

    #[tokio::test]
    async fn corrupt_history_is_replaced_by_new_rows() {
        let store = MemoryStore::with_file("h.csv", b"\x00\x00\x00");
        let report = sync_history(&store, "h.csv", &batch(), SchemaDrift::Intersection)
            .await
            .unwrap();
        assert!(report.history_discarded);
        assert_eq!(report.stats.final_rows, 1);
    }

    #[tokio::test]
    async fn download_failure_aborts_without_writing() {
        let mut store = MemoryStore::with_file("h.csv", b"id\nold\n");
        store.fail_download = true;
        let err = sync_history(&store, "h.csv", &batch(), SchemaDrift::Intersection)
            .await
            .unwrap_err();
        assert!(matches!(err, HistoryError::UnexpectedStatus { status: 500, .. }));
        assert_eq!(store.content("h.csv"), "id\nold\n");
    }
}
