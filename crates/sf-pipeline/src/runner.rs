//! Per-chunk bulk job execution.
//!
//! Each chunk gets its own job: create, submit the rows as one CSV batch, poll
//! until the batch is done, close the job and fetch the row results. Two retry
//! layers wrap this:
//!
//! - the whole job is retried with a fresh job on submission failures
//! - submit/poll/close/fetch is retried on the same job on connection failures

use tracing::{debug, info};

use sf_writer_client::{retry, RetryConfig};

use crate::error::{Error, ErrorKind, Result};
use crate::session::{BulkSession, JobSpec, RowResult};
use crate::settings::RunSettings;
use crate::source::InputRow;

/// Runs chunks as bulk jobs on one session.
pub struct JobRunner<'a, S> {
    session: &'a S,
    spec: JobSpec,
    headers: Vec<String>,
    chunk_retry: RetryConfig,
    transfer_retry: RetryConfig,
}

impl<'a, S: BulkSession> JobRunner<'a, S> {
    /// `headers` become the CSV header line of every batch.
    pub fn new(session: &'a S, spec: JobSpec, headers: &[String], settings: &RunSettings) -> Self {
        Self {
            session,
            spec,
            headers: headers.to_vec(),
            chunk_retry: settings.chunk_retry.clone(),
            transfer_retry: settings.transfer_retry.clone(),
        }
    }

    /// Write one chunk and return one result per row, in row order.
    pub async fn run_chunk(&self, rows: &[InputRow]) -> Result<Vec<RowResult>> {
        let csv_data = encode_chunk(&self.headers, rows)?;
        retry(
            &self.chunk_retry,
            "bulk job",
            || self.run_job(&csv_data, rows.len()),
            Error::is_bulk_submission,
        )
        .await
    }

    async fn run_job(&self, csv_data: &str, expected: usize) -> Result<Vec<RowResult>> {
        let job_id = self.session.create_job(&self.spec).await?;
        info!(job_id = %job_id, rows = expected, "Created bulk job");

        let results = retry(
            &self.transfer_retry,
            "bulk transfer",
            || self.transfer(&job_id, csv_data),
            Error::is_transient_network,
        )
        .await?;

        // Results carry no row key: alignment is positional
        if results.len() != expected {
            return Err(Error::new(ErrorKind::BulkSubmission(format!(
                "job {job_id} returned {} results for {expected} rows",
                results.len()
            ))));
        }
        Ok(results)
    }

    async fn transfer(&self, job_id: &str, csv_data: &str) -> Result<Vec<RowResult>> {
        let batch_id = self.session.submit_batch(job_id, csv_data.to_string()).await?;
        debug!(job_id, batch_id = %batch_id, "Batch submitted");
        self.session.wait_for_batch(job_id, &batch_id).await?;
        self.session.close_job(job_id).await?;
        self.session.batch_results(job_id, &batch_id).await
    }
}

/// Encode rows as a CSV batch with a header line.
pub fn encode_chunk(headers: &[String], rows: &[InputRow]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row.values())?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|err| Error::from(err.into_error()))?;
    String::from_utf8(bytes).map_err(|err| Error::with_source(ErrorKind::Csv(err.to_string()), err))
}
