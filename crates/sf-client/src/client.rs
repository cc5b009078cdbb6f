//! The raw HTTP client.

use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::request::{Body, Request};
use crate::response::Response;

/// Sends [`Request`]s, retrying throttled and unavailable responses
/// according to [`ClientConfig::retry`].
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .user_agent(config.user_agent.as_str())
            .gzip(config.compressed_responses)
            .deflate(config.compressed_responses)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send `request` and return its 2xx response.
    ///
    /// Non-2xx responses become errors. Throttling, 5xx and connection
    /// failures are retried first when the client has a retry schedule.
    #[instrument(skip_all, fields(method = ?request.method(), url = %request.url()))]
    pub async fn execute(&self, request: &Request) -> Result<Response> {
        let Some(retry) = &self.config.retry else {
            return self.execute_raw(request).await?.error_for_status().await;
        };
        let mut schedule = retry.schedule();

        loop {
            let err = match self.execute_unthrottled(request).await {
                Ok(response) => return response.error_for_status().await,
                Err(err) if err.is_retryable() => err,
                Err(err) => return Err(err),
            };
            let Some(wait) = schedule.next(err.retry_after()) else {
                return Err(Error::with_source(
                    ErrorKind::RetriesExhausted {
                        attempts: schedule.tries(),
                        last_error: err.to_string(),
                    },
                    err,
                ));
            };
            warn!(
                attempt = schedule.tries(),
                wait_ms = wait.as_millis() as u64,
                error = %err,
                "Request failed, retrying"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Send once and fail on throttling or server unavailability, leaving
    /// other statuses to the caller.
    async fn execute_unthrottled(&self, request: &Request) -> Result<Response> {
        let response = self.execute_raw(request).await?;
        match response.status() {
            429 => Err(Error::new(ErrorKind::RateLimited {
                retry_after: response.retry_after(),
            })),
            status @ (500 | 502 | 503 | 504) => Err(Error::new(ErrorKind::Http {
                status,
                message: "server unavailable".to_string(),
            })),
            _ => Ok(response),
        }
    }

    /// Send once and return the response whatever its status.
    ///
    /// The SOAP login reports faults as HTTP 500 and reads them from here.
    pub async fn execute_raw(&self, request: &Request) -> Result<Response> {
        let mut builder = self.inner.request(request.method().into(), request.url());
        for (name, value) in request.headers() {
            builder = builder.header(name, value);
        }
        if let Some(body) = request.body() {
            builder = builder.header("Content-Type", body.content_type());
            builder = match body {
                Body::Json(value) => builder.body(serde_json::to_vec(value)?),
                Body::Csv(text) | Body::Xml(text) => builder.body(text.clone()),
            };
        }

        debug!(method = ?request.method(), url = %request.url(), "Sending request");
        let response = builder.send().await?;
        debug!(status = response.status().as_u16(), "Response received");

        Ok(Response::new(response))
    }
}
