//! # sf-writer-pipeline
//!
//! Loads one CSV table into a Salesforce object through the Bulk API.
//!
//! ## Flow
//!
//! 1. [`WriterConfig::resolve`] validates the job parameters
//! 2. [`RowSource`] streams the input rows and checks the table fits the operation
//! 3. [`authenticate_with_retry`] opens a [`BulkSession`]
//! 4. [`chunks`] splits the rows and [`JobRunner`] writes each chunk as one job
//! 5. [`reconcile`] counts the outcomes and [`report`] handles rejected rows
//!
//! [`run`] ties these together; [`run_data_dir`] adds the data directory
//! conventions used by the binary.
//!
//! ## Example
//!
//! ```rust,ignore
//! use sf_writer_pipeline::{run_data_dir, DataDir, RunSettings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), sf_writer_pipeline::Error> {
//!     let report = run_data_dir(&DataDir::new("/data"), &RunSettings::default()).await?;
//!     println!("{} rows failed", report.summary.error_count);
//!     Ok(())
//! }
//! ```

mod batch;
mod config;
mod datadir;
mod error;
mod reconcile;
mod report;
mod run;
mod runner;
mod session;
mod settings;
mod source;

#[cfg(test)]
mod testing;

pub use batch::{chunks, Chunks, DEFAULT_BATCH_SIZE};
pub use config::{WriterConfig, MAX_BATCH_SIZE};
pub use datadir::DataDir;
pub use error::{Error, ErrorKind, Result, EXIT_INTERNAL_ERROR, EXIT_USER_ERROR};
pub use reconcile::{reconcile, ParsedResult, RunSummary, FAILURE_FLAG};
pub use report::{log_failed_rows, report, write_unsuccessful, ERROR_COLUMN, FAILED_ROW_SAMPLE};
pub use run::{run, run_data_dir, RunReport};
pub use runner::{encode_chunk, JobRunner};
pub use session::{
    authenticate_with_retry, BulkSession, JobSpec, LoginCredentials, RowResult,
    SalesforceSession, SalesforceSessionFactory, SessionFactory, AUTHENTICATION_FAILED,
};
pub use settings::RunSettings;
pub use source::{rewrite_headers, InputRow, RowSource, Rows};
