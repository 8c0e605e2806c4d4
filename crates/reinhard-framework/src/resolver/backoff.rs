//! Bounded exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Retry schedule settings.
///
/// The first attempt runs immediately. Before attempt `n + 1` the schedule
/// waits `initial_delay_ms * multiplier^(n - 1)` milliseconds (capped at
/// `max_delay_ms`) plus up to `jitter_ms` of random delay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the second attempt.
    pub initial_delay_ms: u64,
    /// Upper bound for the exponential part of the delay.
    pub max_delay_ms: u64,
    /// Growth factor between consecutive delays.
    pub multiplier: f64,
    /// Upper bound of the random delay added to each wait.
    pub jitter_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay_ms: 1_000,
            max_delay_ms: 64_000,
            multiplier: 2.0,
            jitter_ms: 1_000,
        }
    }
}

impl BackoffConfig {
    /// Starts a fresh schedule.
    pub fn start(&self) -> Backoff {
        Backoff::new(self.clone())
    }
}

/// One run of a retry schedule.
///
/// ```rust,ignore
/// let mut backoff = BackoffConfig::default().start();
/// while let Some(attempt) = backoff.next().await {
///     match lookup().await {
///         Ok(value) => return Ok(value),
///         Err(e) => warn!(attempt, error = %e, "Lookup failed"),
///     }
/// }
/// ```
#[derive(Debug)]
pub struct Backoff {
    config: BackoffConfig,
    attempt: u32,
    deferred: Option<Duration>,
}

impl Backoff {
    /// Creates a schedule that has not made any attempt yet.
    pub fn new(config: BackoffConfig) -> Self {
        Self {
            config,
            attempt: 0,
            deferred: None,
        }
    }

    /// Number of attempts started so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Returns `true` once every attempt has been used.
    pub fn is_exhausted(&self) -> bool {
        self.attempt >= self.config.max_attempts
    }

    /// Makes the next wait last at least `delay`.
    pub fn defer(&mut self, delay: Duration) {
        self.deferred = Some(self.deferred.map_or(delay, |current| current.max(delay)));
    }

    /// Waits as needed and starts the next attempt.
    ///
    /// Returns the 1-based attempt number, or `None` when exhausted.
    pub async fn next(&mut self) -> Option<u32> {
        if self.is_exhausted() {
            return None;
        }

        if self.attempt > 0 {
            let delay = self.next_delay();
            trace!(attempt = self.attempt, delay_ms = delay.as_millis() as u64, "Backing off");
            tokio::time::sleep(delay).await;
        }

        self.attempt += 1;
        Some(self.attempt)
    }

    fn next_delay(&mut self) -> Duration {
        let exponent = self.attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let base = (self.config.initial_delay_ms as f64 * self.config.multiplier.powi(exponent))
            .min(self.config.max_delay_ms as f64)
            .max(0.0);
        let jitter = if self.config.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        let delay = Duration::from_millis(base as u64).saturating_add(Duration::from_millis(jitter));

        match self.deferred.take() {
            Some(deferred) => delay.max(deferred),
            None => delay,
        }
    }
}
