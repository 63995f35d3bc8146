//! Error types for the benchmark run.

use graphprobe_core::ids::GroupId;
use graphprobe_core::Error;
use reqwest::StatusCode;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// A creation call issued by the provisioner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// `POST /directory/administrativeUnits`
    CreateAdministrativeUnit(String),
    /// `POST /groups`
    CreateGroup(String),
    /// `POST /directory/administrativeUnits/{id}/members`
    CreateNestedGroup(String),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateAdministrativeUnit(name) => {
                write!(f, "creating administrative unit `{name}`")
            }
            Self::CreateGroup(name) => write!(f, "creating group `{name}`"),
            Self::CreateNestedGroup(name) => {
                write!(f, "creating group `{name}` in administrative unit")
            }
        }
    }
}

/// A provisioning call did not produce a new resource.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Rejected locally before any request was sent.
    #[error("{operation} rejected: {reason}")]
    InvalidRequest {
        /// The attempted operation.
        operation: Operation,
        /// Why the request was rejected.
        reason: String,
    },

    /// The request failed in transport or with a non-2xx status.
    #[error("{operation} failed: {source}")]
    Request {
        /// The attempted operation.
        operation: Operation,
        /// Underlying client error.
        #[source]
        source: Error,
    },

    /// The directory answered 2xx but not `201 Created`.
    #[error("{operation} returned {status}, expected 201 Created")]
    UnexpectedStatus {
        /// The attempted operation.
        operation: Operation,
        /// Status actually returned.
        status: StatusCode,
    },

    /// Shutdown was requested while the call was in flight.
    #[error("{operation} cancelled")]
    Cancelled {
        /// The attempted operation.
        operation: Operation,
    },
}

impl ProvisionError {
    /// Returns the operation that failed.
    #[must_use]
    pub const fn operation(&self) -> &Operation {
        match self {
            Self::InvalidRequest { operation, .. }
            | Self::Request { operation, .. }
            | Self::UnexpectedStatus { operation, .. }
            | Self::Cancelled { operation } => operation,
        }
    }
}

/// The probe loop ended without observing the group.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// A read failed with something other than 404.
    #[error("reading group {group} failed on attempt {attempts}: {source}")]
    Failed {
        /// Group being probed.
        group: GroupId,
        /// Reads issued, including the failing one.
        attempts: u32,
        /// Underlying client error.
        #[source]
        source: Error,
    },

    /// The poll policy bound was reached first.
    #[error("group {group} still not visible after {attempts} attempts ({elapsed:?})")]
    Exceeded {
        /// Group being probed.
        group: GroupId,
        /// Reads issued.
        attempts: u32,
        /// Time since the group was created.
        elapsed: Duration,
    },

    /// Shutdown was requested.
    #[error("probe of group {group} cancelled after {attempts} attempts")]
    Cancelled {
        /// Group being probed.
        group: GroupId,
        /// Reads issued before cancellation.
        attempts: u32,
    },
}

/// A benchmark run stopped before completing every scenario.
#[derive(Debug, Error)]
pub enum RunError {
    /// Provisioning failed.
    #[error(transparent)]
    Provision(#[from] ProvisionError),

    /// Waiting for visibility failed.
    #[error(transparent)]
    Probe(#[from] ProbeError),
}

impl RunError {
    /// Returns true if the run stopped because of a shutdown request.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Provision(ProvisionError::Cancelled { .. })
                | Self::Probe(ProbeError::Cancelled { .. })
        )
    }
}
