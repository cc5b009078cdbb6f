//! Reporting of rejected rows.
//!
//! Row results have no key, so failed rows are recovered by reading the input
//! table again and pairing rows with results by position.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{error, info};

use crate::error::{Error, ErrorKind, Result};
use crate::reconcile::{ParsedResult, RunSummary};
use crate::source::{InputRow, RowSource};

/// Failed rows logged before a fail-fast run stops.
pub const FAILED_ROW_SAMPLE: usize = 15;

/// Name of the extra column holding the Salesforce error.
pub const ERROR_COLUMN: &str = "error";

/// Table manifest registered next to an output table.
#[derive(Debug, Serialize)]
struct TableManifest<'a> {
    columns: &'a [String],
}

/// Handle rejected rows according to `fail_on_error`.
///
/// Returns the path of the written table, or `None` when every row succeeded.
pub fn report(
    source: &RowSource,
    parsed: &[ParsedResult],
    summary: RunSummary,
    fail_on_error: bool,
    out_dir: &Path,
    table_name: &str,
) -> Result<Option<PathBuf>> {
    if summary.error_count == 0 {
        return Ok(None);
    }
    if fail_on_error {
        log_failed_rows(source, parsed)?;
        return Err(Error::new(ErrorKind::RowFailures {
            count: summary.error_count,
        }));
    }
    write_unsuccessful(source, parsed, out_dir, table_name).map(Some)
}

/// Log up to [`FAILED_ROW_SAMPLE`] failed rows with their errors and return
/// how many were logged.
pub fn log_failed_rows(source: &RowSource, parsed: &[ParsedResult]) -> Result<usize> {
    let sample = failed_row_sample(source, parsed)?;
    for (row, result) in &sample {
        error!(
            row = %describe(row),
            error = result.error.as_deref().unwrap_or_default(),
            "Failed to write row"
        );
    }
    Ok(sample.len())
}

/// The first [`FAILED_ROW_SAMPLE`] failed rows. Reading stops once the
/// sample is full.
fn failed_row_sample<'a>(
    source: &RowSource,
    parsed: &'a [ParsedResult],
) -> Result<Vec<(InputRow, &'a ParsedResult)>> {
    failed_rows(source, parsed)?
        .take(FAILED_ROW_SAMPLE)
        .collect()
}

/// Write every failed row plus its error to `<out_dir>/<table_name>` and
/// register the table with a manifest.
pub fn write_unsuccessful(
    source: &RowSource,
    parsed: &[ParsedResult],
    out_dir: &Path,
    table_name: &str,
) -> Result<PathBuf> {
    info!(table = table_name, "Saving errors");
    fs::create_dir_all(out_dir)?;
    let path = out_dir.join(table_name);

    let mut columns = source.headers().to_vec();
    columns.push(ERROR_COLUMN.to_string());

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_path(&path)?;
    writer.write_record(&columns)?;
    for pair in failed_rows(source, parsed)? {
        let (row, result) = pair?;
        let error = result.error.as_deref().unwrap_or_default();
        writer.write_record(row.values().iter().map(String::as_str).chain([error]))?;
    }
    writer.flush()?;
    drop(writer);

    write_manifest(&path, &columns)?;
    Ok(path)
}

fn write_manifest(table: &Path, columns: &[String]) -> Result<()> {
    let mut manifest = table.as_os_str().to_owned();
    manifest.push(".manifest");
    let json = serde_json::to_string(&TableManifest { columns })?;
    fs::write(PathBuf::from(manifest), json)?;
    Ok(())
}

/// Re-read the source and yield the rows whose result is a failure.
fn failed_rows<'a>(
    source: &RowSource,
    parsed: &'a [ParsedResult],
) -> Result<impl Iterator<Item = Result<(InputRow, &'a ParsedResult)>> + 'a> {
    let mut results = parsed.iter();
    let rows = source.rows()?;
    Ok(rows
        .map(move |row| {
            let row = row?;
            let result = results.next().ok_or_else(|| {
                Error::new(ErrorKind::Other(
                    "input table has more rows than Salesforce returned results".to_string(),
                ))
            })?;
            Ok((row, result))
        })
        .filter(|pair| !matches!(pair, Ok((_, result)) if !result.is_failure())))
}

fn describe(row: &InputRow) -> String {
    row.headers()
        .iter()
        .zip(row.values())
        .map(|(h, v)| format!("{h}={v}"))
        .collect::<Vec<_>>()
        .join(", ")
}
