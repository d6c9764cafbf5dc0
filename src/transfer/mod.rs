//! Moving credentials in and out of the vault: browser CSV exports and
//! the import report shared with backup restore.

pub mod csv;

use serde::{Deserialize, Serialize};

pub use self::csv::{detect_format, parse_csv, write_csv, CsvFormat, ImportedLogin};

/// Outcome of a bulk import (CSV or backup restore).
///
/// Imports are best-effort per record: duplicates are counted in
/// `skipped` with a message in `errors`, they never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub total_processed: usize,
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
}

impl ImportReport {
    pub(crate) fn new(total_processed: usize) -> Self {
        Self {
            total_processed,
            ..Self::default()
        }
    }

    pub(crate) fn record_duplicate(&mut self, service_name: &str, username: &str) {
        self.skipped += 1;
        self.errors
            .push(format!("Skipped duplicate: {service_name} ({username})"));
    }
}
