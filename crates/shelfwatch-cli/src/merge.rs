//! The offline `reconcile` command: merge two CSV files on disk with the
//! same rules the end-of-run history update applies.

use std::path::Path;

use shelfwatch_core::SchemaDrift;
use shelfwatch_history::{read_history, reconcile};

/// Merge `batch` into `history` and write the result to `out`.
///
/// A missing, empty, or unreadable history file is treated as absent.
///
/// # Errors
///
/// Returns an error if the batch file cannot be read or holds no rows, or
/// if the merged table cannot be written.
pub(crate) async fn run_reconcile_files(
    history: &Path,
    batch: &Path,
    out: &Path,
    drift: SchemaDrift,
) -> anyhow::Result<()> {
    let existing = match tokio::fs::read(history).await {
        Ok(bytes) => {
            let table = read_history(&bytes);
            if table.is_none() {
                tracing::warn!(path = %history.display(), "history file is empty or corrupt; ignoring it");
            }
            table
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %history.display(), "history file not found; starting a new one");
            None
        }
        Err(e) => anyhow::bail!("failed to read {}: {e}", history.display()),
    };

    let batch_bytes = tokio::fs::read(batch)
        .await
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", batch.display()))?;
    let Some(new) = read_history(&batch_bytes) else {
        anyhow::bail!("batch file {} has no readable rows", batch.display());
    };

    let merged = reconcile(existing.as_ref(), &new, drift);
    let bytes = merged.table.to_csv_bytes()?;
    if let Some(dir) = out.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", dir.display()))?;
    }
    tokio::fs::write(out, bytes)
        .await
        .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", out.display()))?;

    tracing::info!(
        out = %out.display(),
        existing_rows = merged.stats.existing_rows,
        new_rows = merged.stats.new_rows,
        duplicates_removed = merged.stats.duplicates_removed,
        final_rows = merged.stats.final_rows,
        dropped_columns = ?merged.stats.dropped_columns,
        "reconciled"
    );
    Ok(())
}
