//! Input table reading.
//!
//! A [`RowSource`] owns the path of the input CSV and its headers. Every call
//! to [`RowSource::rows`] re-opens the file, so the table can be read once for
//! the upload and once more for reporting.

use std::collections::BTreeSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use sf_writer_bulk::BulkOperation;

use crate::error::{Error, Result};

/// One input row keyed by the (possibly rewritten) headers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    headers: Arc<Vec<String>>,
    values: Vec<String>,
}

impl InputRow {
    pub fn new(headers: Arc<Vec<String>>, values: Vec<String>) -> Self {
        Self { headers, values }
    }

    /// Value of the named column.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.values.get(i))
            .map(String::as_str)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Values in header order.
    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Replace every occurrence of `replace_string` in each header with `.`.
///
/// Used to spell relationship fields such as `Account.External_Id__c` in
/// column names that cannot contain dots.
pub fn rewrite_headers(headers: &[String], replace_string: Option<&str>) -> Vec<String> {
    match replace_string {
        Some(pattern) if !pattern.is_empty() => headers
            .iter()
            .map(|h| h.replace(pattern, "."))
            .collect(),
        _ => headers.to_vec(),
    }
}

/// Restartable reader over the input table.
#[derive(Debug, Clone)]
pub struct RowSource {
    path: PathBuf,
    raw_headers: Vec<String>,
    headers: Arc<Vec<String>>,
}

impl RowSource {
    /// Open `path`, read its header row and apply the header rewrite.
    pub fn open(path: impl AsRef<Path>, replace_string: Option<&str>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = csv::Reader::from_path(&path)?;
        let raw_headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if raw_headers.is_empty() {
            return Err(Error::configuration(format!(
                "Input table {} has no header row",
                path.display()
            )));
        }

        let headers = rewrite_headers(&raw_headers, replace_string);
        debug!(path = %path.display(), headers = ?headers, "Opened input table");

        Ok(Self {
            path,
            raw_headers,
            headers: Arc::new(headers),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Headers as they appear in the file.
    pub fn raw_headers(&self) -> &[String] {
        &self.raw_headers
    }

    /// Headers after the rewrite, used as Salesforce field names.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Check that the table fits the operation before anything is sent.
    pub fn validate(&self, operation: BulkOperation, upsert_field: Option<&str>) -> Result<()> {
        if operation == BulkOperation::Delete && self.headers.len() != 1 {
            return Err(Error::configuration(format!(
                "Delete operation should only have one column with id, input table contains {} columns",
                self.headers.len()
            )));
        }

        if let Some(field) = upsert_field {
            if !self.headers.iter().any(|h| h == field) {
                return Err(Error::configuration(format!(
                    "Upsert field '{field}' is not present in the input table columns: {}",
                    self.headers.join(", ")
                )));
            }
        }

        Ok(())
    }

    /// Stream the data rows from the start of the file.
    pub fn rows(&self) -> Result<Rows> {
        let reader = csv::Reader::from_path(&self.path)?;
        Ok(Rows {
            records: reader.into_records(),
            headers: Arc::clone(&self.headers),
            header_sets: [
                self.raw_headers.iter().cloned().collect(),
                self.headers.iter().cloned().collect(),
            ],
        })
    }
}

/// Iterator over the data rows of a [`RowSource`].
///
/// Rows whose values, taken as a set, equal the header set are skipped: they
/// are repeated header lines, not data.
pub struct Rows {
    records: csv::StringRecordsIntoIter<File>,
    headers: Arc<Vec<String>>,
    header_sets: [BTreeSet<String>; 2],
}

impl Rows {
    fn is_header_row(&self, record: &csv::StringRecord) -> bool {
        let values: BTreeSet<&str> = record.iter().collect();
        self.header_sets.iter().any(|set| {
            set.len() == values.len() && set.iter().all(|h| values.contains(h.as_str()))
        })
    }
}

impl Iterator for Rows {
    type Item = Result<InputRow>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let record = match self.records.next()? {
                Ok(record) => record,
                Err(err) => return Some(Err(err.into())),
            };
            if self.is_header_row(&record) {
                debug!(position = ?record.position(), "Skipping repeated header row");
                continue;
            }
            let values = record.iter().map(str::to_string).collect();
            return Some(Ok(InputRow::new(Arc::clone(&self.headers), values)));
        }
    }
}
