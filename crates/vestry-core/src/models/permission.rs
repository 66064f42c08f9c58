//! The permission catalog.
//!
//! Permissions are a fixed, closed enumeration of capability strings.
//! They are referenced throughout the system, never derived: a role
//! bundles a subset of this catalog, and every "can the user do X"
//! check reduces to membership in a resolved permission set.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::VestryError;

/// A capability the application understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Permission {
    /// Create, edit, and archive songs in the church library.
    #[serde(rename = "manage-songs")]
    ManageSongs,
    /// Plan services and edit service orders.
    #[serde(rename = "manage-services")]
    ManageServices,
    /// Invite, remove, and assign roles/skills to members.
    #[serde(rename = "manage-members")]
    ManageMembers,
    /// Edit church settings, roles, and subscription.
    #[serde(rename = "manage-church")]
    ManageChurch,
}

impl Permission {
    /// The full catalog, in canonical order.
    pub const CATALOG: [Permission; 4] = [
        Permission::ManageSongs,
        Permission::ManageServices,
        Permission::ManageMembers,
        Permission::ManageChurch,
    ];

    /// The full catalog as a set.
    pub fn catalog() -> BTreeSet<Permission> {
        Self::CATALOG.iter().copied().collect()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageSongs => "manage-songs",
            Permission::ManageServices => "manage-services",
            Permission::ManageMembers => "manage-members",
            Permission::ManageChurch => "manage-church",
        }
    }

    /// Human-readable description shown in the role editor.
    pub fn description(&self) -> &'static str {
        match self {
            Permission::ManageSongs => "Manage the song library",
            Permission::ManageServices => "Plan and edit services",
            Permission::ManageMembers => "Manage members, roles and skills",
            Permission::ManageChurch => "Manage church settings and subscription",
        }
    }

    /// Parse a capability string against the closed catalog.
    pub fn parse(s: &str) -> Result<Permission, VestryError> {
        match s {
            "manage-songs" => Ok(Permission::ManageSongs),
            "manage-services" => Ok(Permission::ManageServices),
            "manage-members" => Ok(Permission::ManageMembers),
            "manage-church" => Ok(Permission::ManageChurch),
            other => Err(VestryError::InvalidPermission {
                permission: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Permission {
    type Err = VestryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::parse(s)
    }
}
