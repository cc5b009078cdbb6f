//! Retry and polling settings for a run.

use std::time::Duration;

use sf_writer_bulk::{DEFAULT_MAX_WAIT, DEFAULT_POLL_INTERVAL};
use sf_writer_client::RetryConfig;

/// Timing knobs of the pipeline.
///
/// `Default` gives the production values. Tests shrink the delays.
#[derive(Debug, Clone)]
pub struct RunSettings {
    /// Login attempts on rejected credentials.
    pub auth_retry: RetryConfig,
    /// Fresh-job attempts per chunk on submission failures.
    pub chunk_retry: RetryConfig,
    /// Submit/poll/close/fetch attempts on connection failures.
    pub transfer_retry: RetryConfig,
    pub poll_interval: Duration,
    pub max_wait: Duration,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            auth_retry: RetryConfig::fixed(3, Duration::from_secs(5)),
            chunk_retry: RetryConfig::exponential(4, Duration::from_secs(10), 2.0),
            transfer_retry: RetryConfig::exponential(4, Duration::from_secs(10), 2.0),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: DEFAULT_MAX_WAIT,
        }
    }
}

impl RunSettings {
    /// Same attempt counts with every delay removed.
    pub fn without_delays(mut self) -> Self {
        self.auth_retry = self.auth_retry.without_delay();
        self.chunk_retry = self.chunk_retry.without_delay();
        self.transfer_retry = self.transfer_retry.without_delay();
        self.poll_interval = Duration::ZERO;
        self
    }
}
