//! HTTP client settings.

use std::time::Duration;

use crate::retry::RetryConfig;

/// Settings for [`crate::HttpClient`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Retries for throttled and unavailable responses. `None` sends each
    /// request once.
    pub retry: Option<RetryConfig>,
    /// Whole-request timeout. Batch uploads and result downloads are large,
    /// so this is generous.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub user_agent: String,
    /// Accept gzip/deflate encoded responses.
    pub compressed_responses: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            retry: Some(RetryConfig::default()),
            timeout: Duration::from_secs(120),
            connect_timeout: Duration::from_secs(10),
            user_agent: crate::USER_AGENT.to_string(),
            compressed_responses: true,
        }
    }
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.config.retry = Some(retry);
        self
    }

    /// Send every request exactly once. Callers that retry at a higher
    /// level use this.
    pub fn without_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    pub fn with_compressed_responses(mut self, enabled: bool) -> Self {
        self.config.compressed_responses = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.retry, Some(RetryConfig::default()));
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert!(config.compressed_responses);
        assert!(config.user_agent.starts_with("sf-writer/"));
    }

    #[test]
    fn test_builder_overrides() {
        let config = ClientConfig::builder()
            .without_retry()
            .with_timeout(Duration::from_secs(5))
            .with_connect_timeout(Duration::from_secs(1))
            .with_compressed_responses(false)
            .with_user_agent("loader/0.1")
            .build();

        assert!(config.retry.is_none());
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.connect_timeout, Duration::from_secs(1));
        assert!(!config.compressed_responses);
        assert_eq!(config.user_agent, "loader/0.1");
    }
}
