//! Strongly-typed identifiers for directory objects.
//!
//! Directory object ids are GUIDs assigned by the service on creation. Each
//! object type gets its own wrapper so a group id can never be passed where an
//! administrative unit id is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

macro_rules! object_id {
    ($(#[$meta:meta])* pub struct $name:ident => $kind:literal;) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Object type named in parse errors.
            pub const KIND: &'static str = $kind;

            /// Wraps a GUID returned by the directory.
            #[must_use]
            pub const fn new(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Random id for fixtures and test doubles.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(Uuid::new_v4())
            }

            /// The underlying GUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            /// Parses the hyphenated GUID form Graph uses in URLs and bodies.
            ///
            /// # Errors
            ///
            /// Returns [`Error::InvalidId`] naming the object type.
            pub fn parse_str(input: &str) -> Result<Self> {
                input
                    .parse::<Uuid>()
                    .map(Self)
                    .map_err(|_| Error::InvalidId(format!("{} id `{input}`", Self::KIND)))
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(input: &str) -> Result<Self> {
                Self::parse_str(input)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }
    };
}

object_id! {
    /// Object id of an administrative unit.
    pub struct AdministrativeUnitId => "administrative unit";
}

object_id! {
    /// Object id of a group.
    pub struct GroupId => "group";
}
