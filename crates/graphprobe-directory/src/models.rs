//! Graph models for administrative units and groups.

use chrono::{DateTime, Utc};
use graphprobe_core::ids::{AdministrativeUnitId, GroupId};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Group type tag for Microsoft 365 ("unified") groups.
pub const GROUP_TYPE_UNIFIED: &str = "Unified";

/// `@odata.type` discriminator used when creating a group as an
/// administrative unit member.
pub(crate) const ODATA_TYPE_GROUP: &str = "#microsoft.graph.group";

/// A successful directory response: the HTTP status and the decoded resource.
#[derive(Debug, Clone, PartialEq)]
pub struct DirectoryResponse<T> {
    /// Status code returned by the directory (always 2xx).
    pub status: StatusCode,
    /// Decoded response body.
    pub resource: T,
}

impl<T> DirectoryResponse<T> {
    /// Wraps a decoded resource with its status.
    #[must_use]
    pub const fn new(status: StatusCode, resource: T) -> Self {
        Self { status, resource }
    }

    /// Shorthand for a `201 Created` response.
    #[must_use]
    pub const fn created(resource: T) -> Self {
        Self::new(StatusCode::CREATED, resource)
    }

    /// Shorthand for a `200 OK` response.
    #[must_use]
    pub const fn ok(resource: T) -> Self {
        Self::new(StatusCode::OK, resource)
    }

    /// Returns true if the directory reported that a resource was created.
    #[must_use]
    pub fn is_created(&self) -> bool {
        self.status == StatusCode::CREATED
    }
}

/// Administrative unit as returned by Graph.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdministrativeUnit {
    /// Object id assigned by the directory.
    pub id: AdministrativeUnitId,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Visibility setting (`Public` or `HiddenMembership`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<String>,
}

/// Request body for creating an administrative unit.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewAdministrativeUnit {
    /// Display name.
    pub display_name: String,
}

impl NewAdministrativeUnit {
    /// Creates a request with only a display name.
    #[must_use]
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
        }
    }
}

/// Request body for creating a group.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NewGroup {
    /// Display name.
    pub display_name: String,
    /// Mail alias, unique within the tenant.
    pub mail_nickname: String,
    /// Whether the group is mail-enabled.
    pub mail_enabled: bool,
    /// Whether the group is a security group.
    pub security_enabled: bool,
    /// Group type tags, e.g. `Unified`.
    pub group_types: Vec<String>,
}

impl NewGroup {
    /// Creates a plain (not mail-enabled, not security) group request.
    #[must_use]
    pub fn new(display_name: impl Into<String>, mail_nickname: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            mail_nickname: mail_nickname.into(),
            mail_enabled: false,
            security_enabled: false,
            group_types: Vec::new(),
        }
    }

    /// Sets the mail-enabled flag.
    #[must_use]
    pub const fn mail_enabled(mut self, enabled: bool) -> Self {
        self.mail_enabled = enabled;
        self
    }

    /// Sets the security-enabled flag.
    #[must_use]
    pub const fn security_enabled(mut self, enabled: bool) -> Self {
        self.security_enabled = enabled;
        self
    }

    /// Appends a group type tag.
    #[must_use]
    pub fn group_type(mut self, tag: impl Into<String>) -> Self {
        self.group_types.push(tag.into());
        self
    }
}

/// Body of a nested creation request: the group plus its `@odata.type`.
#[derive(Debug, Serialize)]
pub(crate) struct ScopedNewGroup<'a> {
    #[serde(rename = "@odata.type")]
    pub odata_type: &'static str,
    #[serde(flatten)]
    pub group: &'a NewGroup,
}

impl<'a> ScopedNewGroup<'a> {
    pub(crate) const fn new(group: &'a NewGroup) -> Self {
        Self {
            odata_type: ODATA_TYPE_GROUP,
            group,
        }
    }
}

/// Group as returned by a creation call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    /// Object id assigned by the directory.
    pub id: GroupId,
    /// Display name.
    #[serde(default)]
    pub display_name: Option<String>,
    /// Mail alias.
    #[serde(default)]
    pub mail_nickname: Option<String>,
    /// Mail address assigned by the directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mail: Option<String>,
    /// Whether the group is mail-enabled.
    #[serde(default)]
    pub mail_enabled: Option<bool>,
    /// Whether the group is a security group.
    #[serde(default)]
    pub security_enabled: Option<bool>,
    /// Group type tags.
    #[serde(default)]
    pub group_types: Vec<String>,
    /// Creation timestamp recorded by the directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date_time: Option<DateTime<Utc>>,
}

impl Group {
    /// Returns true if the group carries the `Unified` type tag.
    #[must_use]
    pub fn is_unified(&self) -> bool {
        self.group_types.iter().any(|tag| tag == GROUP_TYPE_UNIFIED)
    }
}

/// Projected view of a group returned by a `$select` read.
///
/// Graph only returns the selected properties, so every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GroupSnapshot {
    /// Object id, when selected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<GroupId>,
    /// Whether people outside the organization can send mail to the group.
    #[serde(default)]
    pub allow_external_senders: Option<bool>,
    /// Whether new members are subscribed to email notifications.
    #[serde(default)]
    pub auto_subscribe_new_members: Option<bool>,
    /// Whether the group is hidden from address lists.
    #[serde(default)]
    pub hide_from_address_lists: Option<bool>,
    /// Whether the group is hidden from Outlook clients.
    #[serde(default)]
    pub hide_from_outlook_clients: Option<bool>,
}

/// A fixed `$select` projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Projection(&'static [&'static str]);

impl Projection {
    /// Exchange-backed group properties, served only once the group has
    /// reached the mail backend.
    pub const EXCHANGE_SETTINGS: Self = Self(&[
        "allowExternalSenders",
        "autoSubscribeNewMembers",
        "hideFromAddressLists",
        "hideFromOutlookClients",
    ]);

    /// Returns the selected field names.
    #[must_use]
    pub const fn fields(&self) -> &'static [&'static str] {
        self.0
    }

    /// Returns true if no fields are selected.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
