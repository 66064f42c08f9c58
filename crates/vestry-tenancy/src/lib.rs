//! Vestry Tenancy — the service layer over the repository traits.
//!
//! This crate owns the tenant lifecycle and authorization semantics:
//! - [`churches::ChurchService`] — tenant creation, lookup, deactivation
//! - [`registry::RegistryService`] — role/skill CRUD with built-in
//!   protection and permission-coverage validation
//! - [`memberships::MembershipService`] — membership lifecycle with the
//!   last-administrator lockout guard
//! - [`assignments::AssignmentService`] — idempotent role/skill
//!   assignment and permission resolution
//! - [`bootstrap::Bootstrap`] — idempotent seeding of built-ins and
//!   owner auto-promotion
//! - [`migrate::LegacyMigration`] — the one-shot single-tenant to
//!   multi-tenant conversion
//!
//! Services are generic over the repository traits so this crate has
//! no dependency on the database crate.

pub mod assignments;
pub mod bootstrap;
pub mod churches;
pub mod config;
pub mod error;
pub mod memberships;
pub mod migrate;
pub mod registry;
pub mod slug;
