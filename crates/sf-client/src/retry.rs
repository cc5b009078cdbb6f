//! Retry schedules.
//!
//! A [`RetryConfig`] describes how many times something is tried and how
//! long to wait in between. The HTTP client uses it for throttled and
//! unavailable responses; [`retry`] applies it to any async operation with a
//! caller-chosen predicate.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::warn;

/// Longest `Retry-After` the client is willing to honor.
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// How many tries an operation gets and the waits between them.
///
/// The wait before retry `n` (0-based) is `initial_delay * factor^n`, capped
/// at `max_delay`. With `jitter`, up to the same amount again is added at
/// random.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total tries, the first one included.
    pub tries: u32,
    pub initial_delay: Duration,
    pub factor: f64,
    pub max_delay: Duration,
    pub jitter: bool,
}

impl Default for RetryConfig {
    /// Schedule used for throttled or unavailable HTTP responses.
    fn default() -> Self {
        Self {
            tries: 4,
            initial_delay: Duration::from_millis(500),
            factor: 2.0,
            max_delay: Duration::from_secs(30),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// `tries` attempts with the same `delay` between each.
    pub fn fixed(tries: u32, delay: Duration) -> Self {
        Self {
            tries,
            initial_delay: delay,
            factor: 1.0,
            max_delay: delay,
            jitter: false,
        }
    }

    /// `tries` attempts with waits growing by `factor`, uncapped and without
    /// jitter. The last retry waits `initial_delay * factor^(tries - 2)`.
    pub fn exponential(tries: u32, initial_delay: Duration, factor: f64) -> Self {
        Self {
            tries,
            initial_delay,
            factor,
            max_delay: Duration::MAX,
            jitter: false,
        }
    }

    /// A single try.
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    pub fn with_tries(mut self, tries: u32) -> Self {
        self.tries = tries;
        self
    }

    /// Same number of tries, no waiting.
    pub fn without_delay(mut self) -> Self {
        self.initial_delay = Duration::ZERO;
        self.max_delay = Duration::ZERO;
        self.jitter = false;
        self
    }

    /// Wait before retry number `retry` (0-based).
    pub fn delay(&self, retry: u32) -> Duration {
        let scaled = self.initial_delay.as_secs_f64() * self.factor.powi(retry as i32);
        let base = Duration::try_from_secs_f64(scaled)
            .unwrap_or(Duration::MAX)
            .min(self.max_delay);
        if self.jitter && !base.is_zero() {
            let extra = rand::rng().random::<f64>() * base.as_secs_f64();
            base.saturating_add(Duration::from_secs_f64(extra))
        } else {
            base
        }
    }

    pub(crate) fn schedule(&self) -> Schedule<'_> {
        Schedule {
            config: self,
            retries: 0,
        }
    }
}

/// Tracks the retries spent against a [`RetryConfig`].
#[derive(Debug)]
pub(crate) struct Schedule<'a> {
    config: &'a RetryConfig,
    retries: u32,
}

impl Schedule<'_> {
    /// Tries made so far, the first one included.
    pub(crate) fn tries(&self) -> u32 {
        self.retries + 1
    }

    /// Claim the next retry and return how long to wait for it, or `None`
    /// once every try is used. A server `hint` replaces the computed wait.
    pub(crate) fn next(&mut self, hint: Option<Duration>) -> Option<Duration> {
        if self.tries() >= self.config.tries {
            return None;
        }
        let wait = match hint {
            Some(hint) => hint.min(MAX_RETRY_AFTER),
            None => self.config.delay(self.retries),
        };
        self.retries += 1;
        Some(wait)
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or `config` runs out of tries.
///
/// The last error is returned as is.
pub async fn retry<T, E, F, Fut, P>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
    should_retry: P,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let mut schedule = config.schedule();

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if !should_retry(&err) {
            return Err(err);
        }
        let Some(wait) = schedule.next(None) else {
            return Err(err);
        };
        warn!(
            operation = label,
            attempt = schedule.tries(),
            of = config.tries,
            wait_ms = wait.as_millis() as u64,
            error = %err,
            "Retrying"
        );
        tokio::time::sleep(wait).await;
    }
}
