//! Role and skill assignment join records.
//!
//! An assignment is a fact, not a count: uniqueness is enforced on
//! (church_id, user_id, role_id) and (church_id, user_id, skill_id),
//! and assigning twice is a no-op.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A role held by a user within a church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRole {
    pub id: Uuid,
    pub church_id: Uuid,
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A skill tagged on a user within a church.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSkill {
    pub id: Uuid,
    pub church_id: Uuid,
    pub user_id: Uuid,
    pub skill_id: Uuid,
    pub created_at: DateTime<Utc>,
}
