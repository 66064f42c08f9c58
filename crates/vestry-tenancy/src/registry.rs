//! Role/skill registry — tenant-scoped CRUD with built-in protection.

use std::collections::BTreeSet;

use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::permission::Permission;
use vestry_core::models::role::{CreateRole, Role, UpdateRole};
use vestry_core::models::skill::{CreateSkill, Skill, UpdateSkill};
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, PaginatedResult, Pagination, RoleRepository,
    SkillRepository,
};

use crate::churches::ensure_active_church;
use crate::slug::slugify;

/// Role and skill CRUD. Slugs are immutable, built-ins are protected,
/// and deleting a role that users still hold is rejected with the
/// affected-user count.
pub struct RegistryService<C, R, S, A>
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
}

impl<C, R, S, A> RegistryService<C, R, S, A>
where
    C: ChurchRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    pub fn new(church_repo: C, role_repo: R, skill_repo: S, assignment_repo: A) -> Self {
        Self {
            church_repo,
            role_repo,
            skill_repo,
            assignment_repo,
        }
    }

    // -- Roles ------------------------------------------------------

    /// Create a role from raw permission strings. Unknown strings are
    /// rejected against the closed catalog before anything is written.
    pub async fn create_role(
        &self,
        church_id: Uuid,
        name: &str,
        permissions: &[String],
    ) -> VestryResult<Role> {
        ensure_active_church(&self.church_repo, church_id).await?;

        let mut parsed = BTreeSet::new();
        for raw in permissions {
            parsed.insert(Permission::parse(raw)?);
        }

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(VestryError::Validation {
                message: format!("Role name '{name}' produces an empty slug"),
            });
        }

        self.role_repo
            .create(CreateRole {
                church_id,
                name: name.trim().to_string(),
                slug,
                permissions: parsed,
                is_builtin: false,
            })
            .await
    }

    pub async fn get_role(&self, church_id: Uuid, id: Uuid) -> VestryResult<Role> {
        self.role_repo.get_by_id(church_id, id).await
    }

    /// Update a role's name or permissions. The slug cannot change,
    /// and a built-in role cannot be left with zero permissions.
    pub async fn update_role(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateRole,
    ) -> VestryResult<Role> {
        ensure_active_church(&self.church_repo, church_id).await?;

        if input.slug.is_some() {
            return Err(VestryError::ImmutableSlug {
                entity: "role".into(),
                id,
            });
        }

        let role = self.role_repo.get_by_id(church_id, id).await?;
        if role.is_builtin {
            if let Some(permissions) = &input.permissions {
                if permissions.is_empty() {
                    return Err(VestryError::BuiltinProtected {
                        entity: "role".into(),
                        slug: role.slug,
                    });
                }
            }
        }

        self.role_repo.update(church_id, id, input).await
    }

    /// Delete a role. Built-ins are refused; a role that users still
    /// hold is refused with the count so the caller can unassign
    /// first.
    pub async fn delete_role(&self, church_id: Uuid, id: Uuid) -> VestryResult<()> {
        ensure_active_church(&self.church_repo, church_id).await?;

        let role = self.role_repo.get_by_id(church_id, id).await?;
        if role.is_builtin {
            return Err(VestryError::BuiltinProtected {
                entity: "role".into(),
                slug: role.slug,
            });
        }

        let assigned_users = self.assignment_repo.count_role_users(church_id, id).await?;
        if assigned_users > 0 {
            return Err(VestryError::RoleInUse {
                slug: role.slug,
                assigned_users,
            });
        }

        self.role_repo.delete(church_id, id).await
    }

    pub async fn list_roles(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<Role>> {
        self.role_repo.list(church_id, pagination).await
    }

    /// Permissions in the catalog that no role in the church grants.
    ///
    /// Advisory only: an uncovered permission means nobody except
    /// override-holders can perform those actions, which may be
    /// intentional.
    pub async fn validate_permission_coverage(
        &self,
        church_id: Uuid,
    ) -> VestryResult<Vec<Permission>> {
        let roles = self.role_repo.list_all(church_id).await?;
        let covered: BTreeSet<Permission> = roles
            .iter()
            .flat_map(|role| role.permissions.iter().copied())
            .collect();
        Ok(Permission::CATALOG
            .iter()
            .copied()
            .filter(|perm| !covered.contains(perm))
            .collect())
    }

    // -- Skills -----------------------------------------------------

    pub async fn create_skill(&self, church_id: Uuid, name: &str) -> VestryResult<Skill> {
        ensure_active_church(&self.church_repo, church_id).await?;

        let slug = slugify(name);
        if slug.is_empty() {
            return Err(VestryError::Validation {
                message: format!("Skill name '{name}' produces an empty slug"),
            });
        }

        self.skill_repo
            .create(CreateSkill {
                church_id,
                name: name.trim().to_string(),
                slug,
                is_builtin: false,
            })
            .await
    }

    pub async fn get_skill(&self, church_id: Uuid, id: Uuid) -> VestryResult<Skill> {
        self.skill_repo.get_by_id(church_id, id).await
    }

    pub async fn update_skill(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateSkill,
    ) -> VestryResult<Skill> {
        ensure_active_church(&self.church_repo, church_id).await?;

        if input.slug.is_some() {
            return Err(VestryError::ImmutableSlug {
                entity: "skill".into(),
                id,
            });
        }

        self.skill_repo.update(church_id, id, input).await
    }

    pub async fn delete_skill(&self, church_id: Uuid, id: Uuid) -> VestryResult<()> {
        ensure_active_church(&self.church_repo, church_id).await?;

        let skill = self.skill_repo.get_by_id(church_id, id).await?;
        if skill.is_builtin {
            return Err(VestryError::BuiltinProtected {
                entity: "skill".into(),
                slug: skill.slug,
            });
        }

        let assigned_users = self
            .assignment_repo
            .count_skill_users(church_id, id)
            .await?;
        if assigned_users > 0 {
            return Err(VestryError::RoleInUse {
                slug: skill.slug,
                assigned_users,
            });
        }

        self.skill_repo.delete(church_id, id).await
    }

    pub async fn list_skills(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<Skill>> {
        self.skill_repo.list(church_id, pagination).await
    }
}
