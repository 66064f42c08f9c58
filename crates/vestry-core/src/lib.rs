//! Vestry Core — domain models and data-access traits for the
//! multi-tenant church authorization model.
//!
//! This crate has no I/O dependencies. It defines:
//! - The closed [`models::permission::Permission`] catalog
//! - Tenant-scoped domain models (church, membership, role, skill,
//!   assignment joins, legacy users)
//! - Error types ([`error::VestryError`])
//! - Repository traits implemented by `vestry-db`

pub mod error;
pub mod models;
pub mod repository;
