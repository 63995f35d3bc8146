//! The directory operations the benchmark depends on.

use crate::models::{
    AdministrativeUnit, DirectoryResponse, Group, GroupSnapshot, NewAdministrativeUnit, NewGroup,
    Projection,
};
use crate::Result;
use async_trait::async_trait;
use graphprobe_core::ids::{AdministrativeUnitId, GroupId};

/// Create and read operations against a directory.
///
/// Every method returns `Ok` only for a 2xx response; any other status is
/// classified into a [`graphprobe_core::Error`] (404 becomes
/// [`graphprobe_core::Error::NotFound`]).
#[async_trait]
pub trait Directory: Send + Sync {
    /// Creates an administrative unit.
    async fn create_administrative_unit(
        &self,
        unit: &NewAdministrativeUnit,
    ) -> Result<DirectoryResponse<AdministrativeUnit>>;

    /// Creates a group, inside `container` when one is given.
    async fn create_group(
        &self,
        group: &NewGroup,
        container: Option<AdministrativeUnitId>,
    ) -> Result<DirectoryResponse<Group>>;

    /// Reads a group restricted to the given projection.
    async fn get_group(
        &self,
        id: GroupId,
        projection: Projection,
    ) -> Result<DirectoryResponse<GroupSnapshot>>;
}
