//! Test doubles for the directory seam.

use async_trait::async_trait;
use graphprobe_core::ids::{AdministrativeUnitId, GroupId};
use graphprobe_directory::{
    AdministrativeUnit, Directory, DirectoryResponse, Group, GroupSnapshot, NewAdministrativeUnit,
    NewGroup, Projection, Result, GROUP_TYPE_UNIFIED,
};

mockall::mock! {
    pub Directory {}

    #[async_trait]
    impl Directory for Directory {
        async fn create_administrative_unit(
            &self,
            unit: &NewAdministrativeUnit,
        ) -> Result<DirectoryResponse<AdministrativeUnit>>;

        async fn create_group(
            &self,
            group: &NewGroup,
            container: Option<AdministrativeUnitId>,
        ) -> Result<DirectoryResponse<Group>>;

        async fn get_group(
            &self,
            id: GroupId,
            projection: Projection,
        ) -> Result<DirectoryResponse<GroupSnapshot>>;
    }
}

pub fn unit_named(name: &str) -> AdministrativeUnit {
    AdministrativeUnit {
        id: AdministrativeUnitId::new_v4(),
        display_name: Some(name.to_string()),
        description: None,
        visibility: None,
    }
}

pub fn group_from(request: &NewGroup) -> Group {
    Group {
        id: GroupId::new_v4(),
        display_name: Some(request.display_name.clone()),
        mail_nickname: Some(request.mail_nickname.clone()),
        mail: None,
        mail_enabled: Some(request.mail_enabled),
        security_enabled: Some(request.security_enabled),
        group_types: vec![GROUP_TYPE_UNIFIED.to_string()],
        created_date_time: None,
    }
}

pub fn snapshot() -> GroupSnapshot {
    GroupSnapshot {
        allow_external_senders: Some(false),
        auto_subscribe_new_members: Some(false),
        hide_from_address_lists: Some(false),
        hide_from_outlook_clients: Some(false),
        ..GroupSnapshot::default()
    }
}
