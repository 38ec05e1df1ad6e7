//! Historical Reconciler: appends a run's rows to the stored history and
//! collapses rows that are identical in every column.
//!
//! The history is an observation log, one row per product per run. Rows
//! for the same product on different days differ in `fecha_extraccion` and
//! are kept.

use std::collections::HashSet;

use shelfwatch_core::SchemaDrift;
use tracing::{info, warn};

use crate::table::Table;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    pub existing_rows: usize,
    pub new_rows: usize,
    pub duplicates_removed: usize,
    pub final_rows: usize,
    /// Columns present on only one side and left out by the drift policy.
    pub dropped_columns: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Reconciled {
    pub table: Table,
    pub stats: ReconcileStats,
}

/// Merges `new` after `existing`, keeping the first of every set of
/// identical rows and preserving the order of each side.
///
/// With no usable history (absent, empty, or sharing no column with the new
/// rows) the result is the new rows alone.
#[must_use]
pub fn reconcile(existing: Option<&Table>, new: &Table, drift: SchemaDrift) -> Reconciled {
    let existing = existing.filter(|t| !t.is_empty());

    let Some(existing) = existing else {
        return finish(vec![new], new.columns.clone(), 0, new.len(), Vec::new());
    };

    let (columns, dropped) = merged_columns(&existing.columns, &new.columns, drift);
    if columns.is_empty() {
        warn!(
            existing_columns = ?existing.columns,
            "stored history shares no column with this run; starting a new history"
        );
        return finish(vec![new], new.columns.clone(), 0, new.len(), Vec::new());
    }
    if !dropped.is_empty() {
        warn!(dropped = ?dropped, policy = %drift, "history schema differs; columns dropped");
    }

    let existing_projected = existing.project(&columns);
    let new_projected = new.project(&columns);
    finish(
        vec![&existing_projected, &new_projected],
        columns,
        existing.len(),
        new.len(),
        dropped,
    )
}

fn merged_columns(
    existing: &[String],
    new: &[String],
    drift: SchemaDrift,
) -> (Vec<String>, Vec<String>) {
    match drift {
        SchemaDrift::Intersection => {
            let kept: Vec<String> = existing.iter().filter(|c| new.contains(c)).cloned().collect();
            let dropped = existing
                .iter()
                .chain(new.iter())
                .filter(|c| !kept.contains(c))
                .cloned()
                .collect();
            (kept, dropped)
        }
        SchemaDrift::Union => {
            let mut columns = existing.to_vec();
            columns.extend(new.iter().filter(|c| !existing.contains(c)).cloned());
            (columns, Vec::new())
        }
    }
}

fn finish(
    parts: Vec<&Table>,
    columns: Vec<String>,
    existing_rows: usize,
    new_rows: usize,
    dropped_columns: Vec<String>,
) -> Reconciled {
    let mut seen: HashSet<&[String]> = HashSet::new();
    let mut rows = Vec::new();
    for part in parts {
        for row in &part.rows {
            if seen.insert(row.as_slice()) {
                rows.push(row.clone());
            }
        }
    }

    let combined = existing_rows + new_rows;
    let stats = ReconcileStats {
        existing_rows,
        new_rows,
        duplicates_removed: combined - rows.len(),
        final_rows: rows.len(),
        dropped_columns,
    };
    info!(
        existing = stats.existing_rows,
        new = stats.new_rows,
        duplicates_removed = stats.duplicates_removed,
        total = stats.final_rows,
        "history reconciled"
    );

    Reconciled {
        table: Table { columns, rows },
        stats,
    }
}

#[cfg(test)]
#[path = "reconcile_test.rs"]
mod tests;
