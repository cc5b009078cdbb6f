//! Remote capabilities used by the pipeline.
//!
//! The pipeline talks to Salesforce only through [`SessionFactory`] and
//! [`BulkSession`]. [`SalesforceSessionFactory`] implements them on top of the
//! SOAP login and the Bulk API client; tests substitute in-memory fakes.

use std::future::Future;
use std::time::Duration;

use tracing::{info, instrument};

use sf_writer_auth::PasswordLogin;
use sf_writer_bulk::{BatchRecordResult, BulkApiClient, BulkOperation, ConcurrencyMode, CreateJobRequest};
use sf_writer_client::{retry, ClientConfig, RetryConfig};

use crate::error::{Error, ErrorKind, Result};

/// Message reported once every login attempt was rejected.
pub const AUTHENTICATION_FAILED: &str =
    "Authentication Failed : recheck your username, password, and security token";

/// Username, password and security token plus where to log in.
#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
    pub security_token: String,
    pub login_url: String,
    pub api_version: String,
}

impl std::fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .field("api_version", &self.api_version)
            .finish()
    }
}

/// Parameters of every job created during a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSpec {
    pub object: String,
    pub operation: BulkOperation,
    pub external_id_field: Option<String>,
    pub assignment_rule_id: Option<String>,
    pub concurrency_mode: ConcurrencyMode,
}

impl JobSpec {
    fn to_request(&self) -> CreateJobRequest {
        let mut request = CreateJobRequest::new(&self.object, self.operation)
            .with_concurrency_mode(self.concurrency_mode);
        if let Some(field) = &self.external_id_field {
            request = request.with_external_id_field(field);
        }
        if let Some(rule_id) = &self.assignment_rule_id {
            request = request.with_assignment_rule_id(rule_id);
        }
        request
    }
}

/// Outcome of one submitted row, in submission order.
///
/// `success` keeps the literal flag Salesforce returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowResult {
    pub id: Option<String>,
    pub success: String,
    pub created: String,
    pub error: Option<String>,
}

impl From<BatchRecordResult> for RowResult {
    fn from(result: BatchRecordResult) -> Self {
        Self {
            id: result.id,
            success: result.success,
            created: result.created,
            error: result.error,
        }
    }
}

/// Opens authenticated sessions.
pub trait SessionFactory {
    type Session: BulkSession;

    /// Log in once. Rejected credentials fail with [`ErrorKind::Authentication`].
    fn authenticate(
        &self,
        credentials: &LoginCredentials,
    ) -> impl Future<Output = Result<Self::Session>> + Send;
}

/// Bulk job operations on an authenticated session.
pub trait BulkSession {
    /// Create a job and return its id.
    fn create_job(&self, spec: &JobSpec) -> impl Future<Output = Result<String>> + Send;

    /// Upload one CSV batch and return its id.
    fn submit_batch(
        &self,
        job_id: &str,
        csv_data: String,
    ) -> impl Future<Output = Result<String>> + Send;

    /// Poll until the batch is terminal; fails unless it completed.
    fn wait_for_batch(
        &self,
        job_id: &str,
        batch_id: &str,
    ) -> impl Future<Output = Result<()>> + Send;

    fn close_job(&self, job_id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Per-row results of a completed batch.
    fn batch_results(
        &self,
        job_id: &str,
        batch_id: &str,
    ) -> impl Future<Output = Result<Vec<RowResult>>> + Send;
}

/// Authenticate, retrying only when the credentials were rejected.
///
/// Exhausting the attempts yields [`AUTHENTICATION_FAILED`].
pub async fn authenticate_with_retry<F: SessionFactory>(
    factory: &F,
    credentials: &LoginCredentials,
    policy: &RetryConfig,
) -> Result<F::Session> {
    retry(
        policy,
        "authenticate",
        || factory.authenticate(credentials),
        Error::is_authentication,
    )
    .await
    .map_err(|err| match err.kind {
        ErrorKind::Authentication(_) => Error {
            kind: ErrorKind::Authentication(AUTHENTICATION_FAILED.to_string()),
            source: Some(Box::new(err)),
        },
        _ => err,
    })
}

/// Sessions backed by the SOAP login and the Bulk API.
#[derive(Debug, Clone)]
pub struct SalesforceSessionFactory {
    client_config: ClientConfig,
    poll_interval: Duration,
    max_wait: Duration,
}

impl SalesforceSessionFactory {
    /// HTTP-level retries are disabled: the pipeline decides what to retry.
    pub fn new(poll_interval: Duration, max_wait: Duration) -> Self {
        Self {
            client_config: ClientConfig::builder().without_retry().build(),
            poll_interval,
            max_wait,
        }
    }

    pub fn with_client_config(mut self, config: ClientConfig) -> Self {
        self.client_config = config;
        self
    }
}

impl SessionFactory for SalesforceSessionFactory {
    type Session = SalesforceSession;

    #[instrument(skip_all, fields(username = %credentials.username, login_url = %credentials.login_url))]
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<SalesforceSession> {
        let login = PasswordLogin::new(
            &credentials.username,
            &credentials.password,
            &credentials.security_token,
        )?
        .with_login_url(&credentials.login_url)
        .with_api_version(&credentials.api_version)
        .with_client_config(self.client_config.clone())?;

        let session = login.authenticate().await?;
        info!(instance_url = %session.instance_url(), "Logged in to Salesforce");

        let client = BulkApiClient::from_client(session.client(self.client_config.clone())?)
            .with_poll_interval(self.poll_interval)
            .with_max_wait(self.max_wait);
        Ok(SalesforceSession { client })
    }
}

/// An authenticated Bulk API session.
#[derive(Debug, Clone)]
pub struct SalesforceSession {
    client: BulkApiClient,
}

impl SalesforceSession {
    pub fn client(&self) -> &BulkApiClient {
        &self.client
    }
}

impl BulkSession for SalesforceSession {
    async fn create_job(&self, spec: &JobSpec) -> Result<String> {
        let job = self.client.create_job(&spec.to_request()).await?;
        Ok(job.id)
    }

    async fn submit_batch(&self, job_id: &str, csv_data: String) -> Result<String> {
        let batch = self.client.add_batch(job_id, &csv_data).await?;
        Ok(batch.id)
    }

    async fn wait_for_batch(&self, job_id: &str, batch_id: &str) -> Result<()> {
        self.client
            .wait_for_batch(job_id, batch_id)
            .await?
            .into_processed()?;
        Ok(())
    }

    async fn close_job(&self, job_id: &str) -> Result<()> {
        self.client.close_job(job_id).await?;
        Ok(())
    }

    async fn batch_results(&self, job_id: &str, batch_id: &str) -> Result<Vec<RowResult>> {
        let results = self.client.get_batch_results(job_id, batch_id).await?;
        Ok(results.into_iter().map(RowResult::from).collect())
    }
}
