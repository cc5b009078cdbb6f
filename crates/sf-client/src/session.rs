//! A client bound to one Salesforce session.

use serde::{de::DeserializeOwned, Serialize};
use tracing::instrument;

use crate::client::HttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::Request;
use crate::response::Response;
use crate::DEFAULT_API_VERSION;

/// [`HttpClient`] plus the instance URL, session id and API version every
/// async API call needs.
///
/// ```rust,ignore
/// let client = SalesforceClient::new("https://na1.salesforce.com", session_id)?;
/// let job: JobInfo = client.post_json(&client.async_url("job"), &create).await?;
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: HttpClient,
    instance_url: String,
    session_id: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("session_id", &"[REDACTED]")
            .finish()
    }
}

impl SalesforceClient {
    pub fn new(instance_url: impl Into<String>, session_id: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, session_id, ClientConfig::default())
    }

    pub fn with_config(
        instance_url: impl Into<String>,
        session_id: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let mut instance_url = instance_url.into();
        while instance_url.ends_with('/') {
            instance_url.pop();
        }
        Ok(Self {
            http: HttpClient::new(config)?,
            instance_url,
            session_id: session_id.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Use API version `version`, e.g. `"62.0"`.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `{instance}/services/async/{version}/{path}`
    pub fn async_url(&self, path: &str) -> String {
        format!(
            "{}/services/async/{}/{}",
            self.instance_url,
            self.api_version,
            path.trim_start_matches('/')
        )
    }

    pub fn get(&self, url: &str) -> Request {
        Request::get(url).session(&self.session_id)
    }

    pub fn post(&self, url: &str) -> Request {
        Request::post(url).session(&self.session_id)
    }

    pub async fn execute(&self, request: &Request) -> Result<Response> {
        self.http.execute(request).await
    }

    /// POST `body` as JSON and decode the JSON reply.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        url: &str,
        body: &B,
    ) -> Result<T> {
        let request = self
            .post(url)
            .header("Accept", "application/json")
            .json(body)?;
        self.execute(&request).await?.json().await
    }

    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        self.execute(&self.get(url)).await?.text().await
    }
}
