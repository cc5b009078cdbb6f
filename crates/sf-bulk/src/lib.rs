//! # sf-writer-bulk
//!
//! Salesforce Bulk API client for loading CSV data.
//!
//! ## Features
//!
//! - **Jobs** - Insert, Update, Upsert and Delete with serial or parallel
//!   concurrency, external id fields and assignment rules
//! - **Batches** - CSV upload, status polling with a bounded wait
//! - **Results** - Per-record outcomes in submission order
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_writer_bulk::{BulkApiClient, BulkOperation, CreateJobRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sf_writer_bulk::Error> {
//!     let client = BulkApiClient::new("https://myorg.my.salesforce.com", "session_id")?;
//!
//!     let job = client
//!         .create_job(&CreateJobRequest::new("Account", BulkOperation::Insert))
//!         .await?;
//!     let batch = client.add_batch(&job.id, "Name\nAcme Corp\n").await?;
//!     client.wait_for_batch(&job.id, &batch.id).await?.into_processed()?;
//!     client.close_job(&job.id).await?;
//!
//!     for result in client.get_batch_results(&job.id, &batch.id).await? {
//!         println!("{:?} success={}", result.id, result.success);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod types;

pub use client::{BulkApiClient, DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
pub use error::{Error, ErrorKind, Result};
pub use types::{
    parse_batch_results, BatchInfo, BatchRecordResult, BatchState, BulkOperation,
    ConcurrencyMode, ContentType, CreateJobRequest, JobInfo, JobState, JobStateRequest,
};
