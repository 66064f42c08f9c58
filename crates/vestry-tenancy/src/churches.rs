//! Tenant store — church lifecycle.

use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::church::{Church, CreateChurch, SubscriptionTier, UpdateChurch};
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, PaginatedResult, Pagination, RoleRepository,
    SkillRepository,
};

use crate::bootstrap::Bootstrap;
use crate::config::TenancyConfig;
use crate::slug::slugify;

/// Church lifecycle: creation (with built-in seeding), lookup,
/// soft deactivation.
pub struct ChurchService<C, R, S, A>
where
    C: ChurchRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    church_repo: C,
    bootstrap: Bootstrap<C, R, S, A>,
    config: TenancyConfig,
}

impl<C, R, S, A> ChurchService<C, R, S, A>
where
    C: ChurchRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
{
    pub fn new(church_repo: C, bootstrap: Bootstrap<C, R, S, A>, config: TenancyConfig) -> Self {
        Self {
            church_repo,
            bootstrap,
            config,
        }
    }

    /// Create a church, then synchronously run the church-created
    /// bootstrap trigger so the built-ins exist before this returns.
    ///
    /// The slug is derived from the name. A name with no sluggable
    /// characters is rejected; a slug collision surfaces as
    /// `DuplicateSlug`.
    pub async fn create_church(
        &self,
        name: &str,
        owner_user_id: Uuid,
        tier: Option<SubscriptionTier>,
        settings: Option<serde_json::Value>,
    ) -> VestryResult<Church> {
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(VestryError::Validation {
                message: format!("Church name '{name}' produces an empty slug"),
            });
        }

        let church = self
            .church_repo
            .create(CreateChurch {
                name: name.trim().to_string(),
                slug,
                owner_user_id,
                tier: tier.unwrap_or(self.config.default_tier),
                settings,
            })
            .await?;

        self.bootstrap.on_church_created(church.id).await;

        Ok(church)
    }

    /// Fetch an active church. A deactivated church is reported as
    /// not found to ordinary callers; audit paths read the repository
    /// directly.
    pub async fn get_church(&self, id: Uuid) -> VestryResult<Church> {
        let church = self.church_repo.get_by_id(id).await?;
        if !church.is_active {
            return Err(VestryError::NotFound {
                entity: "church".into(),
                id: id.to_string(),
            });
        }
        Ok(church)
    }

    pub async fn get_church_by_slug(&self, slug: &str) -> VestryResult<Church> {
        let church = self.church_repo.get_by_slug(slug).await?;
        if !church.is_active {
            return Err(VestryError::NotFound {
                entity: "church".into(),
                id: slug.to_string(),
            });
        }
        Ok(church)
    }

    pub async fn update_church(&self, id: Uuid, input: UpdateChurch) -> VestryResult<Church> {
        self.get_church(id).await?;
        self.church_repo.update(id, input).await
    }

    /// Soft-deactivate: blocks new writes in every tenant-scoped
    /// service, does not cascade. Children stay readable for audit.
    pub async fn deactivate(&self, id: Uuid) -> VestryResult<()> {
        self.church_repo.set_active(id, false).await
    }

    pub async fn reactivate(&self, id: Uuid) -> VestryResult<()> {
        self.church_repo.set_active(id, true).await
    }

    pub async fn list_churches(
        &self,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<Church>> {
        self.church_repo.list(pagination).await
    }
}

/// Write-path guard shared by the tenant-scoped services: the church
/// must exist and be active.
pub(crate) async fn ensure_active_church<C: ChurchRepository>(
    church_repo: &C,
    church_id: Uuid,
) -> VestryResult<Church> {
    let church = church_repo.get_by_id(church_id).await?;
    if !church.is_active {
        return Err(VestryError::TenantInactive { church_id });
    }
    Ok(church)
}
