//! # sf-writer
//!
//! Batch writer loading a CSV table into Salesforce through the Bulk API.
//!
//! ## Security
//!
//! - Passwords, security tokens and session ids are redacted in Debug output
//! - Tracing/logging skips credential parameters
//! - Session ids are stripped from error messages
//!
//! ## Crates
//!
//! - **sf-writer-client** - HTTP requests, retry schedules and async API error mapping
//! - **sf-writer-auth** - SOAP username/password login
//! - **sf-writer-bulk** - Bulk API: CSV jobs, batch polling, per-record results
//! - **sf-writer-pipeline** - Configuration, batching, retries, reconciliation and reporting
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use sf_writer::{run_data_dir, DataDir, RunSettings};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), sf_writer::Error> {
//!     let report = run_data_dir(&DataDir::new("/data"), &RunSettings::default()).await?;
//!
//!     println!(
//!         "{} records written, {} rejected",
//!         report.summary.success_count, report.summary.error_count
//!     );
//!     Ok(())
//! }
//! ```

// Re-export all crates for convenient access
pub use sf_writer_auth as auth;
pub use sf_writer_bulk as bulk;
pub use sf_writer_client as client;
pub use sf_writer_pipeline as pipeline;

// Re-export commonly used types at the top level
pub use sf_writer_auth::{LoginSession, PasswordLogin};
pub use sf_writer_bulk::{BulkApiClient, BulkOperation};
pub use sf_writer_client::{ClientConfig, SalesforceClient};
pub use sf_writer_pipeline::{
    run, run_data_dir, DataDir, Error, ErrorKind, RunReport, RunSettings, WriterConfig,
};
