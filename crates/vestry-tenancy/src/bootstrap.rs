//! Bootstrap hooks — idempotent seeding of per-church built-ins.
//!
//! Two triggers, invoked synchronously by the services right after the
//! corresponding record is created (an explicit two-phase call rather
//! than a storage-layer event):
//!
//! 1. Church created → ensure the built-in `admin` role (full
//!    permission catalog) and `leader` skill exist.
//! 2. Membership created → if the member is the church owner, ensure
//!    they hold the admin role and the leader skill.
//!
//! Every creation is find-before-create, and a lost create race (the
//! unique (church_id, slug) index fires) is treated as "someone else
//! already seeded it". Failures are logged and swallowed: the church
//! or membership still exists even when its seeding did not, and the
//! hooks do not retry on their own.

use tracing::{debug, warn};
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::membership::ChurchMembership;
use vestry_core::models::permission::Permission;
use vestry_core::models::role::CreateRole;
use vestry_core::models::skill::CreateSkill;
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, RoleRepository, SkillRepository,
};

use crate::config::TenancyConfig;

/// Reactive seeding hooks for new churches and memberships.
pub struct Bootstrap<C, R, S, A>
where
    C: ChurchRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    church_repo: C,
    role_repo: R,
    skill_repo: S,
    assignment_repo: A,
    config: TenancyConfig,
}

impl<C, R, S, A> Bootstrap<C, R, S, A>
where
    C: ChurchRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    pub fn new(
        church_repo: C,
        role_repo: R,
        skill_repo: S,
        assignment_repo: A,
        config: TenancyConfig,
    ) -> Self {
        Self {
            church_repo,
            role_repo,
            skill_repo,
            assignment_repo,
            config,
        }
    }

    /// Church-created trigger: seed the built-in admin role and leader
    /// skill. Safe under at-least-once invocation.
    pub async fn on_church_created(&self, church_id: Uuid) {
        if let Err(e) = self.seed_admin_role(church_id).await {
            warn!(%church_id, error = %e, "Failed to seed built-in admin role");
        }
        if let Err(e) = self.seed_leader_skill(church_id).await {
            warn!(%church_id, error = %e, "Failed to seed built-in leader skill");
        }
    }

    /// Membership-created trigger: auto-promote the church owner.
    ///
    /// If the church cannot be fetched, or the built-ins from the
    /// church-created trigger are missing (ordering race), this logs
    /// and gives up — there is no automatic retry.
    pub async fn on_membership_created(&self, membership: &ChurchMembership) {
        let church = match self.church_repo.get_by_id(membership.church_id).await {
            Ok(church) => church,
            Err(e) => {
                warn!(
                    church_id = %membership.church_id,
                    error = %e,
                    "Owner-promotion hook could not fetch church"
                );
                return;
            }
        };

        if membership.user_id != church.owner_user_id {
            return;
        }

        if let Err(e) = self.promote_owner(church.id, membership.user_id).await {
            warn!(
                church_id = %church.id,
                user_id = %membership.user_id,
                error = %e,
                "Failed to promote church owner"
            );
        }
    }

    async fn seed_admin_role(&self, church_id: Uuid) -> VestryResult<()> {
        if self
            .role_repo
            .find_by_slug(church_id, &self.config.admin_role_slug)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let result = self
            .role_repo
            .create(CreateRole {
                church_id,
                name: self.config.admin_role_name.clone(),
                slug: self.config.admin_role_slug.clone(),
                permissions: Permission::catalog(),
                is_builtin: true,
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            // A concurrent trigger won the create race; the role exists.
            Err(VestryError::DuplicateSlug { .. }) => {
                debug!(%church_id, "Admin role already seeded by a concurrent trigger");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn seed_leader_skill(&self, church_id: Uuid) -> VestryResult<()> {
        if self
            .skill_repo
            .find_by_slug(church_id, &self.config.leader_skill_slug)
            .await?
            .is_some()
        {
            return Ok(());
        }

        let result = self
            .skill_repo
            .create(CreateSkill {
                church_id,
                name: self.config.leader_skill_name.clone(),
                slug: self.config.leader_skill_slug.clone(),
                is_builtin: true,
            })
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(VestryError::DuplicateSlug { .. }) => {
                debug!(%church_id, "Leader skill already seeded by a concurrent trigger");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn promote_owner(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<()> {
        let admin_role = self
            .role_repo
            .find_by_slug(church_id, &self.config.admin_role_slug)
            .await?
            .ok_or_else(|| VestryError::NotFound {
                entity: "role".into(),
                id: format!("slug={}", self.config.admin_role_slug),
            })?;

        // Idempotent: re-promotion of an already-promoted owner is a
        // no-op at the assignment layer.
        self.assignment_repo
            .assign_role(church_id, user_id, admin_role.id)
            .await?;

        let leader_skill = self
            .skill_repo
            .find_by_slug(church_id, &self.config.leader_skill_slug)
            .await?
            .ok_or_else(|| VestryError::NotFound {
                entity: "skill".into(),
                id: format!("slug={}", self.config.leader_skill_slug),
            })?;

        self.assignment_repo
            .assign_skill(church_id, user_id, leader_skill.id)
            .await?;

        Ok(())
    }
}
