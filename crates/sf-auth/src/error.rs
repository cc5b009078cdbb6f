//! Login errors. Messages never carry the password, token or session id.

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

    /// Salesforce answered the login and refused it, as opposed to the
    /// request never getting an answer.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::InvalidLogin(_) | ErrorKind::SoapFault { .. }
        )
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Username, password or security token refused.
    #[error("Login refused: {0}")]
    InvalidLogin(String),

    /// Any other fault returned by the login call.
    #[error("Login fault {code}: {message}")]
    SoapFault { code: String, message: String },

    #[error("Unexpected login response: {0}")]
    InvalidResponse(String),

    /// Credentials unusable before anything is sent.
    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    /// The login endpoint could not be reached or answered without a fault.
    #[error("Login request failed: {0}")]
    Transport(String),
}

impl From<sf_writer_client::Error> for Error {
    fn from(err: sf_writer_client::Error) -> Self {
        Error::with_source(ErrorKind::Transport(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::InvalidResponse(err.to_string()), err)
    }
}
