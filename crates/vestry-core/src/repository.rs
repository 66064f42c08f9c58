//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Tenant-scoped repositories
//! require a `church_id` parameter to enforce data isolation. The
//! traits assume a generic record store; `vestry-db` provides the
//! SurrealDB implementations.

use uuid::Uuid;

use crate::error::VestryResult;
use crate::models::{
    assignment::{UserRole, UserSkill},
    church::{Church, CreateChurch, UpdateChurch},
    legacy::{CreateLegacyUser, LegacyUser},
    membership::{ChurchMembership, CreateMembership, MembershipStatus, UpdateMembership},
    role::{CreateRole, Role, UpdateRole},
    skill::{CreateSkill, Skill, UpdateSkill},
};

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Churches (global scope)
// ---------------------------------------------------------------------------

pub trait ChurchRepository: Send + Sync {
    /// Create a church. A slug collision surfaces as `DuplicateSlug`.
    fn create(&self, input: CreateChurch) -> impl Future<Output = VestryResult<Church>> + Send;
    /// Fetch by id regardless of activation state; callers that must
    /// hide deactivated tenants filter on `is_active`.
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = VestryResult<Church>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = VestryResult<Church>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateChurch,
    ) -> impl Future<Output = VestryResult<Church>> + Send;
    /// Soft activation toggle; never deletes.
    fn set_active(&self, id: Uuid, active: bool) -> impl Future<Output = VestryResult<()>> + Send;
    fn count(&self) -> impl Future<Output = VestryResult<u64>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = VestryResult<PaginatedResult<Church>>> + Send;
}

// ---------------------------------------------------------------------------
// Memberships (tenant-scoped)
// ---------------------------------------------------------------------------

pub trait MembershipRepository: Send + Sync {
    /// Create a membership. A (church, user) collision surfaces as
    /// `DuplicateMembership`.
    fn create(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = VestryResult<ChurchMembership>> + Send;
    fn get_by_id(
        &self,
        church_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = VestryResult<ChurchMembership>> + Send;
    fn find_by_user(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = VestryResult<Option<ChurchMembership>>> + Send;
    fn set_status(
        &self,
        church_id: Uuid,
        id: Uuid,
        status: MembershipStatus,
    ) -> impl Future<Output = VestryResult<ChurchMembership>> + Send;
    fn update(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateMembership,
    ) -> impl Future<Output = VestryResult<ChurchMembership>> + Send;
    /// All memberships with status `Active` for a user, across
    /// churches. The canonical "which tenants is this user in" query.
    fn list_active_for_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = VestryResult<Vec<ChurchMembership>>> + Send;
    fn list(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VestryResult<PaginatedResult<ChurchMembership>>> + Send;
    fn count_active(&self, church_id: Uuid) -> impl Future<Output = VestryResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Roles & Skills (tenant-scoped)
// ---------------------------------------------------------------------------

pub trait RoleRepository: Send + Sync {
    /// Create a role. A (church, slug) collision surfaces as
    /// `DuplicateSlug` — concurrent bootstrap hooks rely on this to
    /// detect that the other writer won.
    fn create(&self, input: CreateRole) -> impl Future<Output = VestryResult<Role>> + Send;
    fn get_by_id(
        &self,
        church_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = VestryResult<Role>> + Send;
    fn find_by_slug(
        &self,
        church_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = VestryResult<Option<Role>>> + Send;
    fn update(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> impl Future<Output = VestryResult<Role>> + Send;
    /// Delete the role and any `user_role` rows that reference it.
    /// Guards (built-in protection, in-use check) live in the
    /// registry service, not here.
    fn delete(&self, church_id: Uuid, id: Uuid) -> impl Future<Output = VestryResult<()>> + Send;
    fn list(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VestryResult<PaginatedResult<Role>>> + Send;
    /// Every role in the church, unpaginated (coverage checks and
    /// migration).
    fn list_all(&self, church_id: Uuid) -> impl Future<Output = VestryResult<Vec<Role>>> + Send;
}

pub trait SkillRepository: Send + Sync {
    fn create(&self, input: CreateSkill) -> impl Future<Output = VestryResult<Skill>> + Send;
    fn get_by_id(
        &self,
        church_id: Uuid,
        id: Uuid,
    ) -> impl Future<Output = VestryResult<Skill>> + Send;
    fn find_by_slug(
        &self,
        church_id: Uuid,
        slug: &str,
    ) -> impl Future<Output = VestryResult<Option<Skill>>> + Send;
    fn update(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateSkill,
    ) -> impl Future<Output = VestryResult<Skill>> + Send;
    fn delete(&self, church_id: Uuid, id: Uuid) -> impl Future<Output = VestryResult<()>> + Send;
    fn list(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = VestryResult<PaginatedResult<Skill>>> + Send;
    fn list_all(&self, church_id: Uuid) -> impl Future<Output = VestryResult<Vec<Skill>>> + Send;
}

// ---------------------------------------------------------------------------
// Assignments (tenant-scoped join records)
// ---------------------------------------------------------------------------

pub trait AssignmentRepository: Send + Sync {
    /// Idempotent: assigning a role the user already holds returns
    /// the existing row.
    fn assign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = VestryResult<UserRole>> + Send;
    /// No-op if the assignment is absent.
    fn unassign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = VestryResult<()>> + Send;
    fn assign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> impl Future<Output = VestryResult<UserSkill>> + Send;
    fn unassign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> impl Future<Output = VestryResult<()>> + Send;
    /// All roles assigned to a user in a church, via a single join
    /// query — O(that user's assignments).
    fn roles_for_user(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = VestryResult<Vec<Role>>> + Send;
    fn skills_for_user(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = VestryResult<Vec<Skill>>> + Send;
    /// User ids currently holding a role (last-admin lockout guard).
    fn users_with_role(
        &self,
        church_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = VestryResult<Vec<Uuid>>> + Send;
    fn count_role_users(
        &self,
        church_id: Uuid,
        role_id: Uuid,
    ) -> impl Future<Output = VestryResult<u64>> + Send;
    fn count_skill_users(
        &self,
        church_id: Uuid,
        skill_id: Uuid,
    ) -> impl Future<Output = VestryResult<u64>> + Send;
}

// ---------------------------------------------------------------------------
// Legacy store (migration only)
// ---------------------------------------------------------------------------

pub trait LegacyRepository: Send + Sync {
    fn create(
        &self,
        input: CreateLegacyUser,
    ) -> impl Future<Output = VestryResult<LegacyUser>> + Send;
    fn list_all(&self) -> impl Future<Output = VestryResult<Vec<LegacyUser>>> + Send;
    fn count(&self) -> impl Future<Output = VestryResult<u64>> + Send;
    /// Records in a legacy collection still missing a `church_id`.
    fn count_missing_church_id(
        &self,
        collection: &str,
    ) -> impl Future<Output = VestryResult<u64>> + Send;
    /// Stamp `church_id` (and optionally `visibility = 'church'`) onto
    /// every record in a legacy collection that lacks one. Returns the
    /// number of records updated.
    fn backfill_church_id(
        &self,
        collection: &str,
        church_id: Uuid,
        set_visibility: bool,
    ) -> impl Future<Output = VestryResult<u64>> + Send;
    /// Advisory lock so two operators cannot run the migration
    /// concurrently. Returns false if another run holds the lock.
    fn try_acquire_migration_lock(&self) -> impl Future<Output = VestryResult<bool>> + Send;
    fn release_migration_lock(&self) -> impl Future<Output = VestryResult<()>> + Send;
}
