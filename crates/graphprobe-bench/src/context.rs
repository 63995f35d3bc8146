//! Shared state handed to every stage of a run.

use graphprobe_core::client::PollPolicy;
use graphprobe_directory::Directory;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

/// Directory handle, poll policy and shutdown signal for one run.
#[derive(Clone)]
pub struct BenchContext {
    directory: Arc<dyn Directory>,
    poll: PollPolicy,
    cancel: CancellationToken,
}

impl BenchContext {
    /// Creates a context with the default poll policy and a fresh token.
    #[must_use]
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self {
            directory,
            poll: PollPolicy::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replaces the poll policy.
    #[must_use]
    pub const fn with_poll_policy(mut self, poll: PollPolicy) -> Self {
        self.poll = poll;
        self
    }

    /// Uses an externally owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Returns the directory handle.
    #[must_use]
    pub fn directory(&self) -> Arc<dyn Directory> {
        Arc::clone(&self.directory)
    }

    /// Returns the poll policy.
    #[must_use]
    pub const fn poll_policy(&self) -> &PollPolicy {
        &self.poll
    }

    /// Returns the cancellation token.
    #[must_use]
    pub const fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }
}
