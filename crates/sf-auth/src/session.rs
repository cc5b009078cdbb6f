//! The result of a successful login.

use sf_writer_client::{ClientConfig, SalesforceClient};

use crate::error::Result;

/// Instance URL and session id handed out by the login call, with the API
/// version the session should use.
///
/// `Debug` hides the session id.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginSession {
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl std::fmt::Debug for LoginSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginSession")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl LoginSession {
    pub fn new(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        api_version: impl Into<String>,
    ) -> Self {
        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }
        Self {
            instance_url,
            session_id: session_id.into(),
            api_version: api_version.into(),
        }
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// A client for the async API authenticated with this session.
    pub fn client(&self, config: ClientConfig) -> Result<SalesforceClient> {
        Ok(
            SalesforceClient::with_config(&self.instance_url, &self.session_id, config)?
                .with_api_version(&self.api_version),
        )
    }
}
