//! Skill domain model.
//!
//! Skills are tenant-scoped capability tags used for team scheduling
//! (e.g. `vocalist`, `drummer`). They carry no authorization weight.
//! Exactly one built-in skill with slug `leader` exists per church.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub church_id: Uuid,
    pub name: String,
    /// Unique within the church, immutable after creation.
    pub slug: String,
    pub is_builtin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields required to create a new skill.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSkill {
    pub church_id: Uuid,
    pub name: String,
    pub slug: String,
    pub is_builtin: bool,
}

/// Fields that can be updated on an existing skill.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UpdateSkill {
    pub name: Option<String>,
    pub slug: Option<String>,
}
