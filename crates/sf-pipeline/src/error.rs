//! Error types for the load pipeline.
//!
//! Every failure that ends a run is classified into an [`ErrorKind`], which
//! decides whether the run retries it and which exit code the binary reports.

pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for failures the user can fix (configuration, credentials,
/// rejected submissions, failed rows in fail-fast mode).
pub const EXIT_USER_ERROR: u8 = 1;

/// Exit code for unexpected internal failures.
pub const EXIT_INTERNAL_ERROR: u8 = 2;

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

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Configuration(message.into()))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }

    pub fn is_bulk_submission(&self) -> bool {
        matches!(self.kind, ErrorKind::BulkSubmission(_))
    }

    pub fn is_transient_network(&self) -> bool {
        matches!(self.kind, ErrorKind::TransientNetwork(_))
    }

    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> u8 {
        match self.kind {
            ErrorKind::Configuration(_)
            | ErrorKind::Authentication(_)
            | ErrorKind::BulkSubmission(_)
            | ErrorKind::TransientNetwork(_)
            | ErrorKind::RowFailures { .. } => EXIT_USER_ERROR,
            ErrorKind::Io(_) | ErrorKind::Csv(_) | ErrorKind::Other(_) => EXIT_INTERNAL_ERROR,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Missing or invalid parameters, or an input table the operation cannot use.
    #[error("{0}")]
    Configuration(String),
    /// Salesforce rejected the credentials.
    #[error("{0}")]
    Authentication(String),
    /// A bulk job or batch was rejected or did not complete.
    #[error("Bulk submission failed: {0}")]
    BulkSubmission(String),
    /// The connection to Salesforce failed before an answer arrived.
    #[error("Connection to Salesforce failed: {0}")]
    TransientNetwork(String),
    /// Rows were rejected and the run is configured to fail on them.
    #[error("{count} records failed to be written to Salesforce")]
    RowFailures { count: usize },
    #[error("I/O error: {0}")]
    Io(String),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("{0}")]
    Other(String),
}

impl From<sf_writer_bulk::Error> for Error {
    fn from(err: sf_writer_bulk::Error) -> Self {
        // An unfinished batch is a job-level failure: a fresh job may succeed
        let kind = if err.is_transient() {
            ErrorKind::TransientNetwork(err.to_string())
        } else {
            ErrorKind::BulkSubmission(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<sf_writer_auth::Error> for Error {
    fn from(err: sf_writer_auth::Error) -> Self {
        let kind = match &err.kind {
            _ if err.is_authentication_failure() => ErrorKind::Authentication(err.to_string()),
            sf_writer_auth::ErrorKind::InvalidCredentials(message) => {
                ErrorKind::Configuration(message.clone())
            }
            sf_writer_auth::ErrorKind::Transport(message) => {
                ErrorKind::TransientNetwork(message.clone())
            }
            _ => ErrorKind::Other(err.to_string()),
        };
        Error::with_source(kind, err)
    }
}

impl From<sf_writer_client::Error> for Error {
    fn from(err: sf_writer_client::Error) -> Self {
        let kind = if err.is_transient() {
            ErrorKind::TransientNetwork(err.to_string())
        } else {
            ErrorKind::Other(err.to_string())
        };
        Error::with_source(kind, err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        Error::with_source(ErrorKind::Csv(err.to_string()), err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Other(err.to_string()), err)
    }
}
