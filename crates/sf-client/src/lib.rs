//! # sf-writer-client
//!
//! HTTP plumbing shared by the login and Bulk API crates.
//!
//! - [`HttpClient`] sends a [`Request`], retries throttled (429) and
//!   unavailable (5xx) responses and maps async API `<error>` bodies to
//!   [`ErrorKind::AsyncApi`]
//! - [`SalesforceClient`] binds it to one session and builds
//!   `/services/async/{version}/...` URLs
//! - [`retry`] runs any async operation against a [`RetryConfig`]
//! - [`security`] validates API names and handles SOAP/XML text
//!
//! ```rust,ignore
//! use sf_writer_client::{ClientConfig, SalesforceClient};
//!
//! let client = SalesforceClient::with_config(
//!     instance_url,
//!     session_id,
//!     ClientConfig::builder().without_retry().build(),
//! )?;
//! let csv = client.get_text(&client.async_url("job/750x/batch/751x/result")).await?;
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
pub mod security;
mod session;

pub use client::HttpClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use request::{Body, Method, Request, SESSION_HEADER};
pub use response::Response;
pub use retry::{retry, RetryConfig, MAX_RETRY_AFTER};
pub use session::SalesforceClient;

/// API version used unless the job configuration names another.
pub const DEFAULT_API_VERSION: &str = "62.0";

pub const USER_AGENT: &str = concat!("sf-writer/", env!("CARGO_PKG_VERSION"));
