//! Error types for sf-bulk.

use crate::types::BatchState;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if the call never got a usable answer from Salesforce
    /// (connection trouble, timeouts, rate limits, 5xx).
    pub fn is_transient(&self) -> bool {
        matches!(self.kind, ErrorKind::Transport(_))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Network-level failure talking to Salesforce.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Salesforce answered with an error.
    #[error("API error: {0}")]
    Api(String),
    /// A batch reached a terminal state without being processed.
    #[error("Batch {batch_id} {state:?}: {message}")]
    BatchFailed {
        batch_id: String,
        state: BatchState,
        message: String,
    },
    /// A batch did not finish within the configured wait.
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("{0}")]
    Other(String),
}

impl From<sf_writer_client::Error> for Error {
    fn from(err: sf_writer_client::Error) -> Self {
        let kind = if err.is_transient() {
            ErrorKind::Transport(err.to_string())
        } else {
            ErrorKind::Api(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::InvalidResponse(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}
