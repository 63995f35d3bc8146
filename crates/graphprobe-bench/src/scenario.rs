//! The benchmark run: one administrative unit, then two measured groups.

use crate::context::BenchContext;
use crate::error::RunError;
use crate::probe::ConsistencyProbe;
use crate::provisioner::{millis, GroupSpec, Provisioner};
use graphprobe_core::ids::{AdministrativeUnitId, GroupId};
use graphprobe_directory::AdministrativeUnit;
use serde::{Serialize, Serializer};
use std::fmt;
use std::time::Duration;
use tracing::info;

/// Default administrative unit name.
pub const DEFAULT_CONTAINER_NAME: &str = "Test AU";
/// Default name of the group created at tenant level.
pub const DEFAULT_UNSCOPED_GROUP: &str = "TestGroupOutsideOfAU2";
/// Default name of the group created inside the administrative unit.
pub const DEFAULT_NESTED_GROUP: &str = "TestGroupInAU";

/// Where a measured group is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scenario {
    /// `POST /groups`
    Unscoped,
    /// `POST /directory/administrativeUnits/{id}/members`
    Nested,
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unscoped => f.write_str("unscoped"),
            Self::Nested => f.write_str("nested"),
        }
    }
}

/// Names used by a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunPlan {
    /// Administrative unit display name.
    pub container_name: String,
    /// Unscoped group.
    pub unscoped_group: GroupSpec,
    /// Nested group.
    pub nested_group: GroupSpec,
}

impl Default for RunPlan {
    fn default() -> Self {
        Self {
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            unscoped_group: GroupSpec::mail_enabled_security(DEFAULT_UNSCOPED_GROUP),
            nested_group: GroupSpec::mail_enabled_security(DEFAULT_NESTED_GROUP),
        }
    }
}

/// Propagation delay observed for one group.
#[derive(Debug, Clone, Serialize)]
pub struct Measurement {
    /// Where the group was created.
    pub scenario: Scenario,
    /// Id assigned by the directory.
    pub group_id: GroupId,
    /// Display name.
    pub display_name: String,
    /// Round-trip time of the creation call.
    #[serde(rename = "creation_ms", serialize_with = "as_millis")]
    pub creation_latency: Duration,
    /// Time from creation returning to the first successful read.
    #[serde(rename = "visibility_ms", serialize_with = "as_millis")]
    pub visibility_latency: Duration,
    /// Reads issued.
    pub attempts: u32,
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// The administrative unit created for the nested scenario.
    pub container_id: AdministrativeUnitId,
    /// One measurement per scenario, in execution order.
    pub measurements: Vec<Measurement>,
}

impl RunReport {
    /// Returns the measurement for `scenario`, if it ran.
    #[must_use]
    pub fn measurement(&self, scenario: Scenario) -> Option<&Measurement> {
        self.measurements.iter().find(|m| m.scenario == scenario)
    }
}

/// Runs the provision-then-poll sequence.
pub struct BenchmarkRun {
    provisioner: Provisioner,
    probe: ConsistencyProbe,
    plan: RunPlan,
}

impl BenchmarkRun {
    /// Prepares a run against the context's directory.
    #[must_use]
    pub fn new(ctx: &BenchContext, plan: RunPlan) -> Self {
        Self {
            provisioner: Provisioner::new(ctx),
            probe: ConsistencyProbe::new(ctx),
            plan,
        }
    }

    /// Creates the administrative unit, then measures the unscoped group and
    /// the nested group in that order.
    ///
    /// # Errors
    ///
    /// Stops at the first provisioning or probe failure.
    pub async fn execute(&self) -> Result<RunReport, RunError> {
        info!(container = %self.plan.container_name, "starting run");
        let container = self
            .provisioner
            .create_container(&self.plan.container_name)
            .await?
            .resource;

        let unscoped = self
            .measure(Scenario::Unscoped, &self.plan.unscoped_group, None)
            .await?;
        let nested = self
            .measure(Scenario::Nested, &self.plan.nested_group, Some(&container))
            .await?;

        Ok(RunReport {
            container_id: container.id,
            measurements: vec![unscoped, nested],
        })
    }

    /// Creates one group and waits until it is readable.
    ///
    /// # Errors
    ///
    /// Returns the provisioning or probe failure.
    pub async fn measure(
        &self,
        scenario: Scenario,
        spec: &GroupSpec,
        container: Option<&AdministrativeUnit>,
    ) -> Result<Measurement, RunError> {
        let created = self
            .provisioner
            .create_group(spec, container.map(|unit| unit.id))
            .await?;
        let group_id = created.resource.id;

        let visibility = self
            .probe
            .wait_until_visible(group_id, created.completed_at)
            .await?;

        info!(
            %scenario,
            group = %group_id,
            seconds = visibility.elapsed.as_secs_f64(),
            attempts = visibility.attempts,
            "measured propagation delay"
        );

        Ok(Measurement {
            scenario,
            group_id,
            display_name: spec.display_name().to_string(),
            creation_latency: created.latency,
            visibility_latency: visibility.elapsed,
            attempts: visibility.attempts,
        })
    }
}

fn as_millis<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(millis(*duration))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ProbeError, ProvisionError};
    use crate::testing::{group_from, snapshot, unit_named, MockDirectory};
    use graphprobe_core::client::PollPolicy;
    use graphprobe_core::Error;
    use graphprobe_directory::DirectoryResponse;
    use mockall::Sequence;
    use std::sync::{Arc, Mutex};

    const INTERVAL: Duration = Duration::from_secs(5);

    /// Directory where the unscoped group shows up after two 404s and the
    /// nested group is readable at once.
    fn reference_directory() -> MockDirectory {
        let unit = unit_named(DEFAULT_CONTAINER_NAME);
        let unit_id = unit.id;
        let unscoped = Arc::new(Mutex::new(None));

        let mut mock = MockDirectory::new();
        mock.expect_create_administrative_unit()
            .times(1)
            .returning(move |_| Ok(DirectoryResponse::created(unit.clone())));

        let recorded = Arc::clone(&unscoped);
        mock.expect_create_group()
            .withf(|group, container| {
                group.display_name == DEFAULT_UNSCOPED_GROUP && container.is_none()
            })
            .times(1)
            .returning(move |group, _| {
                let created = group_from(group);
                *recorded.lock().unwrap() = Some(created.id);
                Ok(DirectoryResponse::created(created))
            });
        mock.expect_create_group()
            .withf(move |group, container| {
                group.display_name == DEFAULT_NESTED_GROUP && *container == Some(unit_id)
            })
            .times(1)
            .returning(|group, _| Ok(DirectoryResponse::created(group_from(group))));

        let mut seq = Sequence::new();
        let first = Arc::clone(&unscoped);
        mock.expect_get_group()
            .withf(move |id, _| Some(*id) == *first.lock().unwrap())
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(Error::NotFound("Request_ResourceNotFound".into())));
        mock.expect_get_group()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(DirectoryResponse::ok(snapshot())));
        mock
    }

    #[tokio::test(start_paused = true)]
    async fn test_reference_run_measures_both_scenarios() {
        let ctx = BenchContext::new(Arc::new(reference_directory()))
            .with_poll_policy(PollPolicy::new().with_interval(INTERVAL));

        let report = BenchmarkRun::new(&ctx, RunPlan::default())
            .execute()
            .await
            .unwrap();

        assert_eq!(report.measurements.len(), 2);
        let unscoped = report.measurement(Scenario::Unscoped).unwrap();
        assert_eq!(unscoped.display_name, DEFAULT_UNSCOPED_GROUP);
        assert_eq!(unscoped.attempts, 3);
        assert!(unscoped.visibility_latency >= INTERVAL * 2);
        assert!(unscoped.visibility_latency < INTERVAL * 3);

        let nested = report.measurement(Scenario::Nested).unwrap();
        assert_eq!(nested.attempts, 1);
        assert!(nested.visibility_latency < INTERVAL);
        assert_eq!(report.measurements[0].scenario, Scenario::Unscoped);
    }

    #[tokio::test]
    async fn test_failed_container_stops_before_groups() {
        let mut mock = MockDirectory::new();
        mock.expect_create_administrative_unit()
            .times(1)
            .returning(|_| Err(Error::Unauthorized("InvalidAuthenticationToken".into())));
        mock.expect_create_group().never();
        mock.expect_get_group().never();

        let ctx = BenchContext::new(Arc::new(mock));
        let err = BenchmarkRun::new(&ctx, RunPlan::default())
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Provision(ProvisionError::Request { .. })));
    }

    #[tokio::test]
    async fn test_failed_poll_stops_before_nested_group() {
        let mut mock = MockDirectory::new();
        mock.expect_create_administrative_unit()
            .returning(|unit| Ok(DirectoryResponse::created(unit_named(&unit.display_name))));
        mock.expect_create_group()
            .times(1)
            .returning(|group, _| Ok(DirectoryResponse::created(group_from(group))));
        mock.expect_get_group()
            .times(1)
            .returning(|_, _| Err(Error::ServiceUnavailable("ServiceUnavailable".into())));

        let ctx = BenchContext::new(Arc::new(mock));
        let err = BenchmarkRun::new(&ctx, RunPlan::default())
            .execute()
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Probe(ProbeError::Failed { attempts: 1, .. })));
    }

    #[test]
    fn test_measurement_serializes_milliseconds() {
        let measurement = Measurement {
            scenario: Scenario::Nested,
            group_id: GroupId::new_v4(),
            display_name: DEFAULT_NESTED_GROUP.to_string(),
            creation_latency: Duration::from_millis(840),
            visibility_latency: Duration::from_secs(10),
            attempts: 3,
        };
        let value = serde_json::to_value(&measurement).unwrap();
        assert_eq!(value["scenario"], "nested");
        assert_eq!(value["creation_ms"], 840);
        assert_eq!(value["visibility_ms"], 10_000);
    }
}
