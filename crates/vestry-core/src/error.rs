//! Error types for the Vestry system.
//!
//! Every variant here is a recoverable-by-caller condition surfaced
//! synchronously; only the bootstrap hooks are allowed to log and
//! swallow failures (see `vestry-tenancy`).

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum VestryError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Duplicate slug: {entity} '{slug}' already exists")]
    DuplicateSlug { entity: String, slug: String },

    #[error("Membership already exists for user {user_id} in church {church_id}")]
    DuplicateMembership { church_id: Uuid, user_id: Uuid },

    #[error("Unknown permission: '{permission}'")]
    InvalidPermission { permission: String },

    #[error("Slug is immutable: {entity} {id}")]
    ImmutableSlug { entity: String, id: Uuid },

    #[error("Built-in {entity} '{slug}' is protected")]
    BuiltinProtected { entity: String, slug: String },

    #[error("'{slug}' is still assigned to {assigned_users} user(s)")]
    RoleInUse { slug: String, assigned_users: u64 },

    #[error("Church {church_id} is deactivated")]
    TenantInactive { church_id: Uuid },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("User {user_id} is the last active administrator of church {church_id}")]
    AdminLockout { church_id: Uuid, user_id: Uuid },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type VestryResult<T> = Result<T, VestryError>;
