//! Username/password login through the SOAP partner API.
//!
//! The password and security token are concatenated as Salesforce expects,
//! and the returned `serverUrl` is reduced to its origin to obtain the
//! instance URL for subsequent async API calls.

use sf_writer_client::security::xml::{self, SoapFault};
use sf_writer_client::{ClientConfig, HttpClient, Request, DEFAULT_API_VERSION};
use tracing::{debug, instrument};

use crate::session::LoginSession;
use crate::error::{Error, ErrorKind, Result};
use crate::PRODUCTION_LOGIN_URL;

/// Fault codes that mean the credentials were refused.
const LOGIN_FAULT_CODES: &[&str] = &[
    "INVALID_LOGIN",
    "LOGIN_MUST_USE_SECURITY_TOKEN",
    "INVALID_OPERATION_WITH_EXPIRED_PASSWORD",
    "PASSWORD_LOCKOUT",
];

/// SOAP login with username, password and security token.
///
/// The password and security token are redacted in Debug output.
#[derive(Clone)]
pub struct PasswordLogin {
    username: String,
    password: String,
    security_token: String,
    login_url: String,
    api_version: String,
    http: HttpClient,
}

impl std::fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl PasswordLogin {
    /// Create a login against the production login endpoint.
    ///
    /// The HTTP client does not retry on its own; callers decide how often a
    /// login is attempted.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        security_token: impl Into<String>,
    ) -> Result<Self> {
        let username = username.into();
        if username.trim().is_empty() {
            return Err(Error::new(ErrorKind::InvalidCredentials(
                "username is empty".to_string(),
            )));
        }

        let http = HttpClient::new(ClientConfig::builder().without_retry().build())?;

        Ok(Self {
            username,
            password: password.into(),
            security_token: security_token.into(),
            login_url: PRODUCTION_LOGIN_URL.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http,
        })
    }

    /// Set the login endpoint (e.g. [`crate::SANDBOX_LOGIN_URL`]).
    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the API version used for the login call and the resulting session.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Replace the HTTP client configuration.
    pub fn with_client_config(mut self, config: ClientConfig) -> Result<Self> {
        self.http = HttpClient::new(config)?;
        Ok(self)
    }

    /// Get the username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Get the login endpoint.
    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Log in and return the session credentials.
    #[instrument(skip(self), fields(username = %self.username, login_url = %self.login_url))]
    pub async fn authenticate(&self) -> Result<LoginSession> {
        let url = format!("{}/services/Soap/u/{}", self.login_url, self.api_version);
        let request = Request::post(url)
            .xml(self.envelope())
            .header("SOAPAction", "login");

        // Faults arrive as HTTP 500, so the body is inspected before the status
        let response = self.http.execute_raw(&request).await?;
        let status = response.status();
        let body = response.text().await?;

        if let Some(fault) = xml::parse_soap_fault(&body) {
            return Err(fault_error(fault));
        }

        if !(200..300).contains(&status) {
            return Err(Error::new(ErrorKind::Transport(format!(
                "login returned HTTP {status}"
            ))));
        }

        let session_id = xml::extract_element(&body, "sessionId").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse("missing sessionId".to_string()))
        })?;
        let server_url = xml::extract_element(&body, "serverUrl").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse("missing serverUrl".to_string()))
        })?;

        let instance_url = instance_url_from(&server_url)?;
        debug!(instance_url = %instance_url, "Login succeeded");

        Ok(LoginSession::new(
            instance_url,
            session_id,
            &self.api_version,
        ))
    }

    fn envelope(&self) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<env:Envelope xmlns:xsd="http://www.w3.org/2001/XMLSchema"
    xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
    xmlns:env="http://schemas.xmlsoap.org/soap/envelope/"
    xmlns:urn="urn:partner.soap.sforce.com">
  <env:Body>
    <urn:login>
      <urn:username>{}</urn:username>
      <urn:password>{}{}</urn:password>
    </urn:login>
  </env:Body>
</env:Envelope>"#,
            xml::escape(&self.username),
            xml::escape(&self.password),
            xml::escape(&self.security_token),
        )
    }
}

/// Reduce a SOAP `serverUrl` to the instance origin.
fn instance_url_from(server_url: &str) -> Result<String> {
    let parsed = url::Url::parse(server_url)?;
    if parsed.host_str().is_none() {
        return Err(Error::new(ErrorKind::InvalidResponse(format!(
            "serverUrl has no host: {server_url}"
        ))));
    }
    Ok(parsed.origin().ascii_serialization())
}

fn fault_error(fault: SoapFault) -> Error {
    let code = fault
        .fault_code
        .rsplit(':')
        .next()
        .unwrap_or(&fault.fault_code)
        .to_string();

    let kind = if LOGIN_FAULT_CODES.contains(&code.as_str()) {
        ErrorKind::InvalidLogin(fault.fault_string.clone())
    } else {
        ErrorKind::SoapFault {
            code,
            message: fault.fault_string.clone(),
        }
    };

    Error::with_source(kind, fault)
}
