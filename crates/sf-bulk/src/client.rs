//! Bulk API client.
//!
//! One job per upload: create the job, add a CSV batch, poll the batch until
//! it reaches a terminal state, close the job and read back the per-record
//! results, which Salesforce returns in the order the rows were submitted.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, instrument};

use sf_writer_client::{ClientConfig, SalesforceClient};

use crate::error::{Error, ErrorKind, Result};
use crate::types::*;

/// Default polling interval for batch status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default maximum wait time for batch completion.
pub const DEFAULT_MAX_WAIT: Duration = Duration::from_secs(3600); // 1 hour

/// Salesforce Bulk API client.
///
/// # Example
///
/// ```rust,ignore
/// use sf_writer_bulk::{BulkApiClient, BulkOperation, CreateJobRequest};
///
/// let client = BulkApiClient::new("https://myorg.my.salesforce.com", session_id)?;
///
/// let job = client
///     .create_job(&CreateJobRequest::new("Account", BulkOperation::Insert))
///     .await?;
/// let batch = client.add_batch(&job.id, "Name\nAcme\n").await?;
/// client.wait_for_batch(&job.id, &batch.id).await?.into_processed()?;
/// client.close_job(&job.id).await?;
/// let results = client.get_batch_results(&job.id, &batch.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct BulkApiClient {
    client: SalesforceClient,
    poll_interval: Duration,
    max_wait: Duration,
}

impl BulkApiClient {
    /// Create a new Bulk API client.
    pub fn new(instance_url: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        let client = SalesforceClient::new(instance_url, session_id)?;
        Ok(Self::from_client(client))
    }

    /// Create a new Bulk API client with custom HTTP configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let client = SalesforceClient::with_config(instance_url, session_id, config)?;
        Ok(Self::from_client(client))
    }

    /// Create a Bulk API client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self {
            client,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }

    /// Get the underlying SalesforceClient.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        self.client.instance_url()
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        self.client.api_version()
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.client = self.client.with_api_version(version);
        self
    }

    /// Set the polling interval for batch status checks.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the maximum wait time for batch completion.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    fn job_url(&self, job_id: &str) -> String {
        self.client.async_url(&format!("job/{job_id}"))
    }

    fn batch_url(&self, job_id: &str, batch_id: &str) -> String {
        self.client
            .async_url(&format!("job/{job_id}/batch/{batch_id}"))
    }

    /// Create a new job.
    #[instrument(skip(self, request), fields(object = %request.object, operation = %request.operation))]
    pub async fn create_job(&self, request: &CreateJobRequest) -> Result<JobInfo> {
        let url = self.client.async_url("job");
        let job: JobInfo = self.client.post_json(&url, request).await?;
        debug!(job_id = %job.id, "Job created");
        Ok(job)
    }

    /// Add a CSV batch to an open job.
    #[instrument(skip(self, csv_data), fields(bytes = csv_data.len()))]
    pub async fn add_batch(&self, job_id: &str, csv_data: &str) -> Result<BatchInfo> {
        let url = format!("{}/batch", self.job_url(job_id));
        let request = self.client.post(&url).csv(csv_data);
        let response = self.client.execute(&request).await?;
        let body = response.text().await?;
        let batch = BatchInfo::parse(&body)?;
        debug!(batch_id = %batch.id, state = ?batch.state, "Batch added");
        Ok(batch)
    }

    /// Get batch status.
    #[instrument(skip(self))]
    pub async fn get_batch_info(&self, job_id: &str, batch_id: &str) -> Result<BatchInfo> {
        let body = self.client.get_text(&self.batch_url(job_id, batch_id)).await?;
        BatchInfo::parse(&body)
    }

    /// Poll a batch until it reaches a terminal state.
    ///
    /// Returns the terminal info whatever the state; use
    /// [`BatchInfo::into_processed`] to reject failed batches.
    #[instrument(skip(self))]
    pub async fn wait_for_batch(&self, job_id: &str, batch_id: &str) -> Result<BatchInfo> {
        let start = std::time::Instant::now();

        loop {
            let batch = self.get_batch_info(job_id, batch_id).await?;

            if batch.state.is_terminal() {
                return Ok(batch);
            }

            if start.elapsed() > self.max_wait {
                return Err(Error::new(ErrorKind::Timeout(format!(
                    "Batch {} did not complete within {:?}",
                    batch_id, self.max_wait
                ))));
            }

            debug!(state = ?batch.state, processed = batch.number_records_processed, "Batch still running");
            sleep(self.poll_interval).await;
        }
    }

    /// Close a job so Salesforce stops accepting batches for it.
    #[instrument(skip(self))]
    pub async fn close_job(&self, job_id: &str) -> Result<JobInfo> {
        let job: JobInfo = self
            .client
            .post_json(&self.job_url(job_id), &JobStateRequest::closed())
            .await?;
        Ok(job)
    }

    /// Get the per-record results of a batch, in submission order.
    #[instrument(skip(self))]
    pub async fn get_batch_results(
        &self,
        job_id: &str,
        batch_id: &str,
    ) -> Result<Vec<BatchRecordResult>> {
        let url = format!("{}/result", self.batch_url(job_id, batch_id));
        let csv_data = self.client.get_text(&url).await?;
        parse_batch_results(&csv_data)
    }
}
