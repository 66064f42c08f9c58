//! Membership manager — membership lifecycle and the last-admin guard.

use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::membership::{
    ChurchMembership, CreateMembership, MembershipStatus, UpdateMembership,
};
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, MembershipRepository, PaginatedResult, Pagination,
    RoleRepository, SkillRepository,
};

use crate::bootstrap::Bootstrap;
use crate::churches::ensure_active_church;
use crate::config::TenancyConfig;

/// Membership lifecycle. Memberships bind users to churches, are
/// unique per (church, user), and are never deleted — removal is the
/// `Inactive` status.
pub struct MembershipService<C, M, R, S, A>
where
    C: ChurchRepository,
    M: MembershipRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    church_repo: C,
    membership_repo: M,
    role_repo: R,
    assignment_repo: A,
    bootstrap: Bootstrap<C, R, S, A>,
    config: TenancyConfig,
}

impl<C, M, R, S, A> MembershipService<C, M, R, S, A>
where
    C: ChurchRepository,
    M: MembershipRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    pub fn new(
        church_repo: C,
        membership_repo: M,
        role_repo: R,
        assignment_repo: A,
        bootstrap: Bootstrap<C, R, S, A>,
        config: TenancyConfig,
    ) -> Self {
        Self {
            church_repo,
            membership_repo,
            role_repo,
            assignment_repo,
            bootstrap,
            config,
        }
    }

    /// Create a membership, then synchronously run the
    /// membership-created bootstrap trigger (owner auto-promotion).
    ///
    /// A second membership for the same (church, user) surfaces as
    /// `DuplicateMembership`.
    pub async fn create_membership(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        status: MembershipStatus,
    ) -> VestryResult<ChurchMembership> {
        ensure_active_church(&self.church_repo, church_id).await?;

        let membership = self
            .membership_repo
            .create(CreateMembership {
                church_id,
                user_id,
                status,
            })
            .await?;

        self.bootstrap.on_membership_created(&membership).await;

        Ok(membership)
    }

    pub async fn get_membership(
        &self,
        church_id: Uuid,
        id: Uuid,
    ) -> VestryResult<ChurchMembership> {
        self.membership_repo.get_by_id(church_id, id).await
    }

    pub async fn find_membership(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> VestryResult<Option<ChurchMembership>> {
        self.membership_repo.find_by_user(church_id, user_id).await
    }

    /// Transition a membership's status.
    ///
    /// All transitions are free except one: taking the last active
    /// holder of the built-in admin role out of `Active` is refused
    /// with `AdminLockout`, so a church can never be left without an
    /// administrator.
    pub async fn set_status(
        &self,
        church_id: Uuid,
        id: Uuid,
        status: MembershipStatus,
    ) -> VestryResult<ChurchMembership> {
        let membership = self.membership_repo.get_by_id(church_id, id).await?;

        if membership.status == MembershipStatus::Active && status != MembershipStatus::Active {
            self.guard_last_admin(church_id, membership.user_id).await?;
        }

        self.membership_repo.set_status(church_id, id, status).await
    }

    pub async fn update_membership(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateMembership,
    ) -> VestryResult<ChurchMembership> {
        ensure_active_church(&self.church_repo, church_id).await?;
        self.membership_repo.update(church_id, id, input).await
    }

    /// Every church the user is actively a member of. Callers pick a
    /// tenant from this list; nothing in the system auto-selects one.
    pub async fn get_active_memberships(
        &self,
        user_id: Uuid,
    ) -> VestryResult<Vec<ChurchMembership>> {
        self.membership_repo.list_active_for_user(user_id).await
    }

    pub async fn list_memberships(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<ChurchMembership>> {
        self.membership_repo.list(church_id, pagination).await
    }

    /// Refuse the transition when `user_id` is the only active-member
    /// holder of the built-in admin role. The admin role itself is
    /// builtin and undeletable, so it cannot vanish mid-check.
    async fn guard_last_admin(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<()> {
        let admin_role = match self
            .role_repo
            .find_by_slug(church_id, &self.config.admin_role_slug)
            .await?
        {
            Some(role) => role,
            // Bootstrap never seeded this church; nothing to guard.
            None => return Ok(()),
        };

        let holders = self
            .assignment_repo
            .users_with_role(church_id, admin_role.id)
            .await?;
        if !holders.contains(&user_id) {
            return Ok(());
        }

        for holder in holders {
            if holder == user_id {
                continue;
            }
            let membership = self.membership_repo.find_by_user(church_id, holder).await?;
            if membership.is_some_and(|m| m.is_active()) {
                return Ok(());
            }
        }

        Err(VestryError::AdminLockout { church_id, user_id })
    }
}
