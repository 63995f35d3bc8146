//! HTTP client settings and the visibility poll policy.
//!
//! [`ClientConfig`] controls how the directory client talks HTTP;
//! [`PollPolicy`] controls how often and for how long a freshly created object
//! is probed before the probe is abandoned.

use std::time::Duration;

/// Graph request deadline, in seconds
pub const GRAPH_DEFAULT_TIMEOUT: u64 = 30;

/// Token endpoint request deadline, in seconds
pub const TOKEN_DEFAULT_TIMEOUT: u64 = 15;

/// Connect deadline, in seconds
pub const DEFAULT_CONNECT_TIMEOUT: u64 = 10;

/// Keep-alive idle timeout, in seconds
pub const DEFAULT_POOL_IDLE_TIMEOUT: u64 = 90;

/// Keep-alive connections kept per host
pub const DEFAULT_POOL_MAX_IDLE_PER_HOST: usize = 10;

/// Default delay between visibility probes, in seconds
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 5;

/// Default wall-clock bound on a single visibility probe, in seconds
pub const DEFAULT_POLL_MAX_WAIT_SECS: u64 = 1800;

/// Fixed-cadence poll policy for read-after-write probes.
///
/// The interval never grows between attempts, so a measurement is quantized to
/// at most one interval. The optional bounds turn a permanently invisible object
/// into an explicit "exceeded" outcome instead of an endless wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Delay between consecutive probes
    pub interval: Duration,

    /// Maximum number of probes, `None` for no limit
    pub max_attempts: Option<u32>,

    /// Maximum time spent probing, `None` for no limit
    pub max_wait: Option<Duration>,
}

impl PollPolicy {
    /// Create a poll policy with default values.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
            max_wait: Some(Duration::from_secs(DEFAULT_POLL_MAX_WAIT_SECS)),
        }
    }

    /// Create a poll policy that probes until the object is visible or fails.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_attempts: None,
            max_wait: None,
        }
    }

    /// Set the delay between probes.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the maximum number of probes.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Set the maximum time spent probing.
    #[must_use]
    pub const fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = Some(max_wait);
        self
    }

    /// Remove both the attempt and the wall-clock bound.
    #[must_use]
    pub const fn without_limits(mut self) -> Self {
        self.max_attempts = None;
        self.max_wait = None;
        self
    }

    /// Returns true if another probe may be issued after `attempts` probes
    /// spanning `elapsed`.
    #[must_use]
    pub fn allows_another(&self, attempts: u32, elapsed: Duration) -> bool {
        if let Some(max) = self.max_attempts {
            if attempts >= max {
                return false;
            }
        }
        match self.max_wait {
            Some(max_wait) => elapsed
                .checked_add(self.interval)
                .is_some_and(|next| next <= max_wait),
            None => true,
        }
    }

    /// Check if any bound is configured.
    #[must_use]
    pub const fn is_bounded(&self) -> bool {
        self.max_attempts.is_some() || self.max_wait.is_some()
    }
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// Transport settings for the Graph HTTP client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientConfig {
    /// Whole-request deadline
    pub timeout: Duration,

    /// Deadline for establishing the TCP/TLS connection
    pub connect_timeout: Duration,

    /// How long an unused keep-alive connection is retained
    pub idle_timeout: Duration,

    /// Keep-alive connections retained per host
    pub max_idle_per_host: usize,

    /// Emit a debug event per Graph exchange and the body at trace level
    pub log_exchanges: bool,

    /// Accept gzip-encoded responses
    pub gzip: bool,
}

impl ClientConfig {
    /// Graph defaults: 30 s requests, exchange logging and gzip on.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            timeout: Duration::from_secs(GRAPH_DEFAULT_TIMEOUT),
            connect_timeout: Duration::from_secs(DEFAULT_CONNECT_TIMEOUT),
            idle_timeout: Duration::from_secs(DEFAULT_POOL_IDLE_TIMEOUT),
            max_idle_per_host: DEFAULT_POOL_MAX_IDLE_PER_HOST,
            log_exchanges: true,
            gzip: true,
        }
    }

    /// Replace the request deadline.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replace the connect deadline.
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Replace the keep-alive idle timeout.
    #[must_use]
    pub const fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Replace the per-host keep-alive limit.
    #[must_use]
    pub const fn with_max_idle_per_host(mut self, max: usize) -> Self {
        self.max_idle_per_host = max;
        self
    }

    /// Toggle per-exchange logging.
    #[must_use]
    pub const fn with_exchange_logging(mut self, enabled: bool) -> Self {
        self.log_exchanges = enabled;
        self
    }

    /// Toggle gzip response decoding.
    #[must_use]
    pub const fn with_gzip(mut self, enabled: bool) -> Self {
        self.gzip = enabled;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}
