//! Creation of the administrative unit and the measured groups.

use crate::context::BenchContext;
use crate::error::{Operation, ProvisionError};
use graphprobe_core::ids::AdministrativeUnitId;
use graphprobe_directory::{
    AdministrativeUnit, Directory, Group, NewAdministrativeUnit, NewGroup, GROUP_TYPE_UNIFIED,
};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

/// The group shape every scenario creates.
///
/// Mail alias equals the display name; the group is a mail-enabled,
/// security-enabled Microsoft 365 group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupSpec {
    display_name: String,
}

impl GroupSpec {
    /// Creates a spec for a group with the given display name.
    #[must_use]
    pub fn mail_enabled_security(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }

    /// Returns the display name.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Builds the creation request body.
    #[must_use]
    pub fn to_request(&self) -> NewGroup {
        NewGroup::new(&self.display_name, &self.display_name)
            .mail_enabled(true)
            .security_enabled(true)
            .group_type(GROUP_TYPE_UNIFIED)
    }
}

/// A resource returned by a successful creation call.
#[derive(Debug, Clone)]
pub struct Provisioned<T> {
    /// The created resource.
    pub resource: T,
    /// Round-trip time of the creation call.
    pub latency: Duration,
    /// When the creation call returned.
    pub completed_at: Instant,
}

/// Issues creation calls against the directory.
pub struct Provisioner {
    directory: Arc<dyn Directory>,
    cancel: CancellationToken,
}

impl Provisioner {
    /// Creates a provisioner bound to the context's directory.
    #[must_use]
    pub fn new(ctx: &BenchContext) -> Self {
        Self {
            directory: ctx.directory(),
            cancel: ctx.cancellation().clone(),
        }
    }

    /// Creates the administrative unit used by the nested scenario.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, on any request error and on any status other
    /// than `201 Created`.
    #[instrument(skip(self))]
    pub async fn create_container(
        &self,
        name: &str,
    ) -> Result<Provisioned<AdministrativeUnit>, ProvisionError> {
        let operation = Operation::CreateAdministrativeUnit(name.to_string());
        if name.trim().is_empty() {
            return Err(ProvisionError::InvalidRequest {
                operation,
                reason: "display name must not be empty".to_string(),
            });
        }

        let request = NewAdministrativeUnit::new(name);
        let created = self
            .issue(operation, self.directory.create_administrative_unit(&request))
            .await?;

        info!(
            id = %created.resource.id,
            latency_ms = millis(created.latency),
            "administrative unit created"
        );
        Ok(created)
    }

    /// Creates a group, inside `container` when one is given.
    ///
    /// # Errors
    ///
    /// Fails on an empty name, on any request error and on any status other
    /// than `201 Created`.
    #[instrument(skip(self, spec), fields(group = %spec.display_name))]
    pub async fn create_group(
        &self,
        spec: &GroupSpec,
        container: Option<AdministrativeUnitId>,
    ) -> Result<Provisioned<Group>, ProvisionError> {
        let name = spec.display_name.clone();
        let operation = match container {
            Some(_) => Operation::CreateNestedGroup(name),
            None => Operation::CreateGroup(name),
        };
        if spec.display_name.trim().is_empty() {
            return Err(ProvisionError::InvalidRequest {
                operation,
                reason: "display name must not be empty".to_string(),
            });
        }

        let request = spec.to_request();
        let created = self
            .issue(operation, self.directory.create_group(&request, container))
            .await?;

        info!(
            id = %created.resource.id,
            container = ?container,
            latency_ms = millis(created.latency),
            "group created"
        );
        Ok(created)
    }

    async fn issue<T, F>(
        &self,
        operation: Operation,
        call: F,
    ) -> Result<Provisioned<T>, ProvisionError>
    where
        F: Future<Output = graphprobe_directory::Result<graphprobe_directory::DirectoryResponse<T>>>,
    {
        let started = Instant::now();
        let result = tokio::select! {
            biased;
            () = self.cancel.cancelled() => {
                return Err(ProvisionError::Cancelled { operation });
            }
            result = call => result,
        };
        let completed_at = Instant::now();

        let response = result.map_err(|source| ProvisionError::Request {
            operation: operation.clone(),
            source,
        })?;
        if !response.is_created() {
            return Err(ProvisionError::UnexpectedStatus {
                operation,
                status: response.status,
            });
        }

        Ok(Provisioned {
            resource: response.resource,
            latency: completed_at - started,
            completed_at,
        })
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
