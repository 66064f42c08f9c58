//! Church (tenant) domain model.
//!
//! The church is the tenant root of the system. Churches are never
//! hard-deleted: deactivation flips `is_active` and blocks new writes
//! while leaving children readable for audit.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tier, carried as data on the tenant.
///
/// Limits are advisory; enforcement lives in the surrounding
/// application, not in this core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubscriptionTier {
    Free,
    Standard,
    Unlimited,
}

impl SubscriptionTier {
    /// Maximum active members, `None` = unlimited.
    pub fn member_limit(&self) -> Option<u32> {
        match self {
            SubscriptionTier::Free => Some(15),
            SubscriptionTier::Standard => Some(100),
            SubscriptionTier::Unlimited => None,
        }
    }
}

/// An isolated tenant. All roles, skills, memberships, and downstream
/// domain records are scoped to exactly one church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Church {
    pub id: Uuid,
    /// Human-readable name.
    pub name: String,
    /// URL-safe, globally unique, immutable after creation.
    pub slug: String,
    /// The user who created the church; auto-promoted by the
    /// bootstrap hooks when their membership is created.
    pub owner_user_id: Uuid,
    pub tier: SubscriptionTier,
    /// Arbitrary tenant settings blob.
    pub settings: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateChurch {
    pub name: String,
    pub slug: String,
    pub owner_user_id: Uuid,
    pub tier: SubscriptionTier,
    pub settings: Option<serde_json::Value>,
}

/// Fields that can be updated on an existing church.
///
/// The slug is deliberately absent: it is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateChurch {
    pub name: Option<String>,
    pub tier: Option<SubscriptionTier>,
    pub settings: Option<serde_json::Value>,
}
