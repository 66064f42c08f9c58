//! Church membership domain model.
//!
//! A membership binds a user to a church with a lifecycle status. It
//! is the single source of truth for "which tenants is this user in".
//! At most one membership exists per (church, user) pair, and
//! memberships are never deleted — removal transitions the status to
//! `Inactive` so the audit trail survives.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::permission::Permission;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MembershipStatus {
    /// Invited but not yet accepted.
    Invited,
    Active,
    /// Removed from the church; kept for audit.
    Inactive,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChurchMembership {
    pub id: Uuid,
    pub church_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
    /// Rarely used: when present, replaces the role-derived
    /// permission set for this user in this church.
    pub permissions_override: Option<BTreeSet<Permission>>,
    /// Musical keys the member prefers, for scheduling UI.
    pub preferred_keys: Vec<String>,
    pub notification_preferences: serde_json::Value,
    pub joined_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChurchMembership {
    /// Convenience flag mirroring `status == Active`. Derived, never
    /// stored — the status is the source of truth.
    pub fn is_active(&self) -> bool {
        self.status == MembershipStatus::Active
    }
}

/// Fields required to create a new membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMembership {
    pub church_id: Uuid,
    pub user_id: Uuid,
    pub status: MembershipStatus,
}

/// Fields that can be updated on an existing membership.
///
/// Status transitions go through the dedicated `set_status` operation,
/// which enforces the last-administrator lockout guard.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateMembership {
    pub preferred_keys: Option<Vec<String>>,
    pub notification_preferences: Option<serde_json::Value>,
    /// `Some(Some(set))` = set override, `Some(None)` = clear,
    /// `None` = no change.
    pub permissions_override: Option<Option<BTreeSet<Permission>>>,
}
