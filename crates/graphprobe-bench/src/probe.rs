//! Read-after-write polling until a created group becomes visible.

use crate::context::BenchContext;
use crate::error::ProbeError;
use crate::provisioner::millis;
use graphprobe_core::client::PollPolicy;
use graphprobe_core::ids::GroupId;
use graphprobe_core::Error;
use graphprobe_directory::{Directory, DirectoryResponse, GroupSnapshot, Projection};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

/// Classification of a single read.
#[derive(Debug)]
pub enum ProbeOutcome {
    /// The read succeeded.
    Visible(GroupSnapshot),
    /// The read returned 404.
    NotYetVisible,
    /// The read failed any other way.
    Failed(Error),
}

impl ProbeOutcome {
    /// Classifies the result of a read. Only `404 Not Found` is retryable.
    #[must_use]
    pub fn classify(result: graphprobe_directory::Result<DirectoryResponse<GroupSnapshot>>) -> Self {
        match result {
            Ok(response) => Self::Visible(response.resource),
            Err(err) if err.is_not_found() => Self::NotYetVisible,
            Err(err) => Self::Failed(err),
        }
    }
}

/// The first successful read of a group.
#[derive(Debug, Clone)]
pub struct Visibility {
    /// Time from the end of the creation call to the successful read.
    pub elapsed: Duration,
    /// Reads issued, including the successful one.
    pub attempts: u32,
    /// Projected properties returned by the successful read.
    pub snapshot: GroupSnapshot,
}

/// Polls the group read endpoint at a fixed interval.
pub struct ConsistencyProbe {
    directory: Arc<dyn Directory>,
    policy: PollPolicy,
    cancel: CancellationToken,
}

impl ConsistencyProbe {
    /// The projection requested on every read.
    pub const PROJECTION: Projection = Projection::EXCHANGE_SETTINGS;

    /// Creates a probe using the context's directory and poll policy.
    #[must_use]
    pub fn new(ctx: &BenchContext) -> Self {
        Self {
            directory: ctx.directory(),
            policy: *ctx.poll_policy(),
            cancel: ctx.cancellation().clone(),
        }
    }

    /// Issues one projected read and classifies it.
    pub async fn probe_once(&self, group: GroupId) -> ProbeOutcome {
        ProbeOutcome::classify(self.directory.get_group(group, Self::PROJECTION).await)
    }

    /// Polls until `group` is readable, measuring from `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`ProbeError::Failed`] on the first non-404 failure,
    /// [`ProbeError::Exceeded`] when the poll policy runs out and
    /// [`ProbeError::Cancelled`] on shutdown.
    #[instrument(skip(self, created_at))]
    pub async fn wait_until_visible(
        &self,
        group: GroupId,
        created_at: Instant,
    ) -> Result<Visibility, ProbeError> {
        let mut attempts: u32 = 0;

        loop {
            attempts += 1;
            let outcome = tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(ProbeError::Cancelled { group, attempts: attempts - 1 });
                }
                outcome = self.probe_once(group) => outcome,
            };
            let elapsed = created_at.elapsed();

            match outcome {
                ProbeOutcome::Visible(snapshot) => {
                    info!(
                        attempt = attempts,
                        elapsed_ms = millis(elapsed),
                        "group visible"
                    );
                    return Ok(Visibility {
                        elapsed,
                        attempts,
                        snapshot,
                    });
                }
                ProbeOutcome::Failed(source) => {
                    warn!(attempt = attempts, error = %source, "group read failed");
                    return Err(ProbeError::Failed {
                        group,
                        attempts,
                        source,
                    });
                }
                ProbeOutcome::NotYetVisible => {
                    info!(
                        attempt = attempts,
                        elapsed_ms = millis(elapsed),
                        "group not visible yet"
                    );
                }
            }

            if !self.policy.allows_another(attempts, elapsed) {
                return Err(ProbeError::Exceeded {
                    group,
                    attempts,
                    elapsed,
                });
            }

            debug!(interval = ?self.policy.interval, "waiting before next read");
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    return Err(ProbeError::Cancelled { group, attempts });
                }
                () = tokio::time::sleep(self.policy.interval) => {}
            }
        }
    }
}
