//! Role domain model.
//!
//! A role is a named, tenant-scoped bundle of permissions. Exactly one
//! built-in role with slug `admin` exists per church, created by the
//! bootstrap hooks with the full permission catalog.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Permission;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    /// Unique within the church, immutable after creation.
    pub slug: String,
    pub permissions: BTreeSet<Permission>,
    /// Built-in roles are protected from deletion and slug mutation.
    pub is_builtin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRole {
    pub church_id: Uuid,
    pub name: String,
    pub slug: String,
    pub permissions: BTreeSet<Permission>,
    pub is_builtin: bool,
}

/// Fields that can be updated on an existing role.
///
/// `slug` is present only so the registry can reject attempts to
/// change it with `ImmutableSlug`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateRole {
    pub name: Option<String>,
    pub permissions: Option<BTreeSet<Permission>>,
    pub slug: Option<String>,
}
