//! Domain models for Vestry.
//!
//! These are the core types shared across all crates. The church is
//! the tenant root; every other entity is scoped to exactly one
//! church via `church_id` and is never shared across tenants.

pub mod assignment;
pub mod church;
pub mod legacy;
pub mod membership;
pub mod permission;
pub mod role;
pub mod skill;
