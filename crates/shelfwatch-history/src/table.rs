//! In-memory form of a history CSV: a header plus string cells.
//!
//! Cells are kept as text so rows written by older runs compare exactly as
//! they were stored.

use shelfwatch_core::{HarvestBatch, ProductRecord};
use tracing::{debug, warn};

use crate::error::HistoryError;

/// Column order of every CSV this tool writes.
pub const HISTORY_COLUMNS: [&str; 12] = [
    "fecha_extraccion",
    "id",
    "numero",
    "nombre",
    "marca",
    "precio_actual",
    "enlace",
    "precio_original",
    "descuento_porcentaje",
    "descuento_importe",
    "precio_actual_original",
    "precio_original_original",
];

const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// One row per record, in batch order, using [`HISTORY_COLUMNS`].
    #[must_use]
    pub fn from_batch(batch: &HarvestBatch) -> Self {
        let mut table = Self::new(HISTORY_COLUMNS.map(str::to_owned).to_vec());
        table.rows = batch.records.iter().map(record_row).collect();
        table
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Re-shapes every row to `columns`; cells for absent columns are empty.
    #[must_use]
    pub fn project(&self, columns: &[String]) -> Self {
        let indices: Vec<Option<usize>> = columns.iter().map(|c| self.column_index(c)).collect();
        let rows = self
            .rows
            .iter()
            .map(|row| {
                indices
                    .iter()
                    .map(|idx| idx.and_then(|i| row.get(i)).cloned().unwrap_or_default())
                    .collect()
            })
            .collect();
        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    /// Serializes the table as comma-separated UTF-8 with a header row.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryError::Csv`] if a row cannot be written.
    pub fn to_csv_bytes(&self) -> Result<Vec<u8>, HistoryError> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }
        writer.into_inner().map_err(|e| {
            HistoryError::Csv(csv::Error::from(std::io::Error::other(e.to_string())))
        })
    }
}

fn record_row(record: &ProductRecord) -> Vec<String> {
    vec![
        record.extracted_at.clone(),
        record.id.clone(),
        record.sequence.to_string(),
        record.name.clone(),
        record.brand.clone(),
        format_number(record.price_current),
        record.link.clone(),
        format_number(record.price_original),
        format_number(record.discount_percent),
        format_number(record.discount_amount),
        record.price_current_text.clone(),
        record.price_original_text.clone(),
    ]
}

/// Empty for missing values; whole numbers keep one decimal (`199.0`) so
/// cells read the same as those in existing history files.
fn format_number(value: Option<f64>) -> String {
    match value {
        None => String::new(),
        Some(v) if v.fract() == 0.0 => format!("{v:.1}"),
        Some(v) => v.to_string(),
    }
}

/// Removes NUL bytes and decodes as UTF-8, falling back to Latin-1.
#[must_use]
pub fn decode_history_bytes(bytes: &[u8]) -> String {
    let cleaned: Vec<u8> = bytes.iter().copied().filter(|b| *b != 0).collect();
    match String::from_utf8(cleaned) {
        Ok(text) => text.trim_start_matches('\u{feff}').to_owned(),
        Err(err) => {
            debug!("history is not UTF-8, decoding as Latin-1");
            err.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// Parses CSV text, guessing the delimiter from the header line.
///
/// Rows whose field count differs from the header are skipped.
///
/// # Errors
///
/// Returns [`HistoryError::Csv`] if the header itself cannot be read.
pub fn parse_csv(text: &str) -> Result<Table, HistoryError> {
    let delimiter = sniff_delimiter(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let columns: Vec<String> = reader.headers()?.iter().map(|h| h.trim().to_owned()).collect();
    let mut table = Table::new(columns);

    let mut skipped = 0usize;
    for result in reader.records() {
        match result {
            Ok(record) if record.len() == table.columns.len() => {
                table.rows.push(record.iter().map(str::to_owned).collect());
            }
            Ok(_) | Err(_) => skipped += 1,
        }
    }
    if skipped > 0 {
        warn!(skipped, "skipped malformed history rows");
    }

    Ok(table)
}

/// Decodes and parses stored history; an unreadable or empty table is
/// treated as absent.
#[must_use]
pub fn read_history(bytes: &[u8]) -> Option<Table> {
    let text = decode_history_bytes(bytes);
    if text.trim().is_empty() {
        return None;
    }
    match parse_csv(&text) {
        Ok(table) if table.columns.iter().all(String::is_empty) || table.is_empty() => {
            warn!("stored history has no rows; ignoring it");
            None
        }
        Ok(table) => Some(table),
        Err(err) => {
            warn!(error = %err, "stored history is unreadable; ignoring it");
            None
        }
    }
}

fn sniff_delimiter(text: &str) -> u8 {
    let header = text.lines().find(|line| !line.trim().is_empty()).unwrap_or("");
    let mut best = b',';
    let mut best_count = 0usize;
    for candidate in DELIMITER_CANDIDATES {
        let count = header.bytes().filter(|b| *b == candidate).count();
        if count > best_count {
            best = candidate;
            best_count = count;
        }
    }
    best
}

#[cfg(test)]
#[path = "table_test.rs"]
mod tests;
