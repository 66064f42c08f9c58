//! Assignment ledger — role/skill assignment and permission resolution.

use std::collections::BTreeSet;

use uuid::Uuid;
use vestry_core::error::VestryResult;
use vestry_core::models::assignment::{UserRole, UserSkill};
use vestry_core::models::permission::Permission;
use vestry_core::models::role::Role;
use vestry_core::models::skill::Skill;
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, MembershipRepository,
};

use crate::churches::ensure_active_church;

/// Role/skill assignment and the permission-resolution query the rest
/// of the application authorizes against.
pub struct AssignmentService<C, M, A>
where
    C: ChurchRepository,
    M: MembershipRepository,
    A: AssignmentRepository,
{
    church_repo: C,
    membership_repo: M,
    assignment_repo: A,
}

impl<C, M, A> AssignmentService<C, M, A>
where
    C: ChurchRepository,
    M: MembershipRepository,
    A: AssignmentRepository,
{
    pub fn new(church_repo: C, membership_repo: M, assignment_repo: A) -> Self {
        Self {
            church_repo,
            membership_repo,
            assignment_repo,
        }
    }

    /// Idempotent: assigning a role the user already holds returns
    /// the existing assignment.
    pub async fn assign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> VestryResult<UserRole> {
        ensure_active_church(&self.church_repo, church_id).await?;
        self.assignment_repo
            .assign_role(church_id, user_id, role_id)
            .await
    }

    /// No-op when the assignment is absent.
    pub async fn unassign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> VestryResult<()> {
        self.assignment_repo
            .unassign_role(church_id, user_id, role_id)
            .await
    }

    pub async fn assign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> VestryResult<UserSkill> {
        ensure_active_church(&self.church_repo, church_id).await?;
        self.assignment_repo
            .assign_skill(church_id, user_id, skill_id)
            .await
    }

    pub async fn unassign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> VestryResult<()> {
        self.assignment_repo
            .unassign_skill(church_id, user_id, skill_id)
            .await
    }

    /// The effective permission set for a user within a church.
    ///
    /// Normally the union of the user's assigned roles' permissions.
    /// When the membership carries a `permissions_override`, that set
    /// replaces the role-derived one entirely. A user with no
    /// membership resolves to the empty set.
    pub async fn resolve_permissions(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> VestryResult<BTreeSet<Permission>> {
        if let Some(membership) = self.membership_repo.find_by_user(church_id, user_id).await? {
            if let Some(override_set) = membership.permissions_override {
                return Ok(override_set);
            }
        } else {
            return Ok(BTreeSet::new());
        }

        let roles = self.assignment_repo.roles_for_user(church_id, user_id).await?;
        Ok(roles
            .into_iter()
            .flat_map(|role| role.permissions.into_iter())
            .collect())
    }

    /// Does the user hold this single permission? Sugar over
    /// [`Self::resolve_permissions`].
    pub async fn has_permission(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        permission: Permission,
    ) -> VestryResult<bool> {
        Ok(self
            .resolve_permissions(church_id, user_id)
            .await?
            .contains(&permission))
    }

    pub async fn resolve_roles(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<Vec<Role>> {
        self.assignment_repo.roles_for_user(church_id, user_id).await
    }

    pub async fn resolve_skills(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<Vec<Skill>> {
        self.assignment_repo
            .skills_for_user(church_id, user_id)
            .await
    }

    pub async fn count_role_users(&self, church_id: Uuid, role_id: Uuid) -> VestryResult<u64> {
        self.assignment_repo.count_role_users(church_id, role_id).await
    }

    pub async fn count_skill_users(&self, church_id: Uuid, skill_id: Uuid) -> VestryResult<u64> {
        self.assignment_repo
            .count_skill_users(church_id, skill_id)
            .await
    }
}
