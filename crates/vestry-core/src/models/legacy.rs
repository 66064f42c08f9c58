//! Legacy (pre-multi-tenant) user records.
//!
//! Before the tenant model, the installation had a flat user list with
//! a free-form `role` string and an optional `church_name`. These
//! records are read by the one-shot legacy migration and are never
//! written by the rest of the system.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyUser {
    pub id: Uuid,
    pub email: Option<String>,
    /// Free-form legacy role string (`admin`, `leader`, `musician`, ...).
    pub role: Option<String>,
    pub church_name: Option<String>,
}

/// Fields for seeding a legacy user (test fixtures and import tooling).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateLegacyUser {
    pub email: Option<String>,
    pub role: Option<String>,
    pub church_name: Option<String>,
}
