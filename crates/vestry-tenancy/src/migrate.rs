//! One-shot legacy migration: single-tenant install to tenant model.
//!
//! The pre-tenant installation had a flat `legacy_user` list and
//! tenant-less content collections. This converts it in place: one
//! default church, one Active membership per legacy user, roles mapped
//! from the legacy role string, and `church_id` stamped onto every
//! content record. Guarded by an advisory lock and short-circuited
//! when any church already exists, so re-running is a no-op.

use std::collections::{BTreeSet, HashMap};

use tracing::{info, warn};
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::legacy::LegacyUser;
use vestry_core::models::membership::{CreateMembership, MembershipStatus};
use vestry_core::models::permission::Permission;
use vestry_core::models::role::CreateRole;
use vestry_core::repository::{
    AssignmentRepository, ChurchRepository, LegacyRepository, MembershipRepository,
    RoleRepository, SkillRepository,
};

use crate::churches::ChurchService;
use crate::config::TenancyConfig;
use crate::error::{MigrationError, MigrationStep};
use crate::slug::slugify;

/// Legacy content collections that receive a `church_id` backfill.
/// Songs also get `visibility = 'church'` so nothing becomes public by
/// accident.
const BACKFILL_COLLECTIONS: &[&str] = &["song", "service", "category", "label"];

/// Map a legacy role string onto a role slug.
///
/// Only `admin` and `leader` have explicit branches; every other
/// value, including `musician` and a missing role, falls to `member`.
pub fn map_legacy_role(raw: Option<&str>) -> &'static str {
    match raw.map(|r| r.trim().to_ascii_lowercase()).as_deref() {
        Some("admin") => "admin",
        Some("leader") => "leader",
        _ => "member",
    }
}

/// Default permission grants for the migrated role slugs.
pub fn default_permissions(slug: &str) -> BTreeSet<Permission> {
    match slug {
        "admin" => Permission::catalog(),
        "leader" => [Permission::ManageSongs, Permission::ManageServices]
            .into_iter()
            .collect(),
        _ => BTreeSet::new(),
    }
}

fn role_display_name(slug: &str) -> &'static str {
    match slug {
        "admin" => "Administrator",
        "leader" => "Leader",
        _ => "Member",
    }
}

/// The most frequent non-empty legacy `church_name`, ties broken by
/// first appearance.
fn most_common_church_name(users: &[LegacyUser]) -> Option<String> {
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, user) in users.iter().enumerate() {
        if let Some(name) = user.church_name.as_deref() {
            let name = name.trim();
            if name.is_empty() {
                continue;
            }
            let entry = counts.entry(name).or_insert((0, position));
            entry.0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(_, (count_a, pos_a)), (_, (count_b, pos_b))| {
            count_a.cmp(count_b).then(pos_b.cmp(pos_a))
        })
        .map(|(name, _)| name.to_string())
}

/// What a completed (or skipped) migration run did.
#[derive(Debug, Default)]
pub struct MigrationReport {
    /// False when a short-circuit fired and nothing was written.
    pub performed: bool,
    pub church_id: Option<Uuid>,
    pub church_name: Option<String>,
    pub users_migrated: u64,
    /// Role slugs created during the run (the builtin admin role is
    /// seeded by bootstrap, not listed here).
    pub roles_created: Vec<String>,
    /// (collection, records stamped) per backfilled collection.
    pub records_backfilled: Vec<(String, u64)>,
    /// Manual follow-ups the migration recommends but never executes.
    pub cleanup_recommendations: Vec<String>,
}

/// Post-migration structural audit.
#[derive(Debug, Default)]
pub struct MigrationValidation {
    pub issues: Vec<String>,
}

impl MigrationValidation {
    pub fn is_ok(&self) -> bool {
        self.issues.is_empty()
    }
}

pub struct LegacyMigration<C, M, R, S, A, L>
where
    C: ChurchRepository,
    M: MembershipRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
    L: LegacyRepository,
{
    churches: ChurchService<C, R, S, A>,
    church_repo: C,
    membership_repo: M,
    role_repo: R,
    assignment_repo: A,
    legacy_repo: L,
    config: TenancyConfig,
}

impl<C, M, R, S, A, L> LegacyMigration<C, M, R, S, A, L>
where
    C: ChurchRepository,
    M: MembershipRepository,
    R: RoleRepository,
    S: SkillRepository,
    A: AssignmentRepository,
    L: LegacyRepository,
{
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        churches: ChurchService<C, R, S, A>,
        church_repo: C,
        membership_repo: M,
        role_repo: R,
        assignment_repo: A,
        legacy_repo: L,
        config: TenancyConfig,
    ) -> Self {
        Self {
            churches,
            church_repo,
            membership_repo,
            role_repo,
            assignment_repo,
            legacy_repo,
            config,
        }
    }

    /// True when no church exists yet and legacy users do.
    pub async fn is_migration_needed(&self) -> VestryResult<bool> {
        if self.church_repo.count().await? > 0 {
            return Ok(false);
        }
        Ok(self.legacy_repo.count().await? > 0)
    }

    /// Run the migration. Returns a no-op report when a short-circuit
    /// fires, an error tagged with the failing step otherwise. The
    /// advisory lock is always released, success or failure.
    pub async fn migrate(&self) -> Result<MigrationReport, MigrationError> {
        let step = MigrationStep::Preflight;

        if self.church_repo.count().await.map_err(|e| MigrationError::at(step, e))? > 0 {
            info!("Churches already exist; legacy migration skipped");
            return Ok(MigrationReport::default());
        }
        let legacy_count = self
            .legacy_repo
            .count()
            .await
            .map_err(|e| MigrationError::at(step, e))?;
        if legacy_count == 0 {
            info!("No legacy users found; legacy migration skipped");
            return Ok(MigrationReport::default());
        }

        let acquired = self
            .legacy_repo
            .try_acquire_migration_lock()
            .await
            .map_err(|e| MigrationError::at(MigrationStep::Lock, e))?;
        if !acquired {
            return Err(MigrationError::at(
                MigrationStep::Lock,
                VestryError::Internal("another migration run holds the advisory lock".into()),
            ));
        }

        let result = self.run_locked(legacy_count).await;

        if let Err(e) = self.legacy_repo.release_migration_lock().await {
            warn!(error = %e, "Failed to release the migration advisory lock");
        }

        result
    }

    async fn run_locked(&self, legacy_count: u64) -> Result<MigrationReport, MigrationError> {
        let users = self
            .legacy_repo
            .list_all()
            .await
            .map_err(|e| MigrationError::at(MigrationStep::Preflight, e))?;

        // Church name: most frequent non-empty legacy church_name,
        // then the legacy admin's, then the configured default. A name
        // that slugifies to nothing also falls to the default.
        let admin_user = users
            .iter()
            .find(|u| map_legacy_role(u.role.as_deref()) == "admin");
        let mut church_name = most_common_church_name(&users)
            .or_else(|| {
                admin_user
                    .and_then(|u| u.church_name.as_deref())
                    .map(|n| n.trim().to_string())
                    .filter(|n| !n.is_empty())
            })
            .unwrap_or_else(|| self.config.default_church_name.clone());
        if slugify(&church_name).is_empty() {
            church_name = self.config.default_church_name.clone();
        }

        // Owner: the first legacy admin, else the first legacy user.
        let owner = admin_user.or_else(|| users.first()).ok_or_else(|| {
            MigrationError::at(
                MigrationStep::Preflight,
                VestryError::Internal("legacy user list emptied mid-run".into()),
            )
        })?;
        let owner_user_id = owner.id;

        // Routed through the service so bootstrap seeds the built-ins.
        let church = self
            .churches
            .create_church(&church_name, owner_user_id, None, None)
            .await
            .map_err(|e| MigrationError::at(MigrationStep::CreateChurch, e))?;

        info!(
            church_id = %church.id,
            church_name = %church.name,
            legacy_users = legacy_count,
            "Migrating legacy installation"
        );

        let mut report = MigrationReport {
            performed: true,
            church_id: Some(church.id),
            church_name: Some(church.name.clone()),
            ..MigrationReport::default()
        };

        for user in &users {
            let role_slug = map_legacy_role(user.role.as_deref());
            let role = self
                .find_or_create_role(church.id, role_slug, &mut report)
                .await
                .map_err(|e| MigrationError::at(MigrationStep::MigrateUsers, e))?;

            // The owner's membership was not pre-created, so every
            // legacy user takes this same path; the owner additionally
            // got admin via the owner-promotion hook.
            match self
                .membership_repo
                .create(CreateMembership {
                    church_id: church.id,
                    user_id: user.id,
                    status: MembershipStatus::Active,
                })
                .await
            {
                Ok(_) | Err(VestryError::DuplicateMembership { .. }) => {}
                Err(e) => return Err(MigrationError::at(MigrationStep::MigrateUsers, e)),
            }

            self.assignment_repo
                .assign_role(church.id, user.id, role.id)
                .await
                .map_err(|e| MigrationError::at(MigrationStep::MigrateUsers, e))?;

            report.users_migrated += 1;
        }

        // When no legacy user was an admin, the owner still must hold
        // the builtin admin role or the church starts locked out.
        if let Some(admin_role) = self
            .role_repo
            .find_by_slug(church.id, &self.config.admin_role_slug)
            .await
            .map_err(|e| MigrationError::at(MigrationStep::MigrateUsers, e))?
        {
            self.assignment_repo
                .assign_role(church.id, owner_user_id, admin_role.id)
                .await
                .map_err(|e| MigrationError::at(MigrationStep::MigrateUsers, e))?;
        }

        for collection in BACKFILL_COLLECTIONS {
            let stamped = self
                .legacy_repo
                .backfill_church_id(collection, church.id, *collection == "song")
                .await
                .map_err(|e| MigrationError::at(MigrationStep::BackfillCollections, e))?;
            report
                .records_backfilled
                .push((collection.to_string(), stamped));
        }

        report.cleanup_recommendations = vec![
            "legacy_user records are no longer read; archive and drop the table".into(),
            "song visibility was defaulted to 'church'; review before publishing any songs".into(),
            "legacy role strings on user accounts can be removed once clients stop reading them"
                .into(),
        ];

        info!(
            users_migrated = report.users_migrated,
            roles_created = report.roles_created.len(),
            "Legacy migration complete"
        );

        Ok(report)
    }

    async fn find_or_create_role(
        &self,
        church_id: Uuid,
        slug: &str,
        report: &mut MigrationReport,
    ) -> VestryResult<vestry_core::models::role::Role> {
        if let Some(role) = self.role_repo.find_by_slug(church_id, slug).await? {
            return Ok(role);
        }

        let created = self
            .role_repo
            .create(CreateRole {
                church_id,
                name: role_display_name(slug).to_string(),
                slug: slug.to_string(),
                permissions: default_permissions(slug),
                is_builtin: false,
            })
            .await?;
        report.roles_created.push(slug.to_string());
        Ok(created)
    }

    /// Re-read migrated state and report structural problems. Never
    /// repairs anything.
    pub async fn validate_migration(&self) -> Result<MigrationValidation, MigrationError> {
        let step = MigrationStep::Validate;
        let wrap = |e| MigrationError::at(step, e);

        let mut validation = MigrationValidation::default();

        if self.church_repo.count().await.map_err(wrap)? == 0 {
            validation.issues.push("no church exists".into());
            return Ok(validation);
        }

        let churches = self
            .church_repo
            .list(vestry_core::repository::Pagination {
                offset: 0,
                limit: 1,
            })
            .await
            .map_err(wrap)?;
        let church = match churches.items.first() {
            Some(church) => church,
            None => {
                validation
                    .issues
                    .push("church count is nonzero but none is listable".into());
                return Ok(validation);
            }
        };

        let admin_role = self
            .role_repo
            .find_by_slug(church.id, &self.config.admin_role_slug)
            .await
            .map_err(wrap)?;
        match admin_role {
            None => validation
                .issues
                .push(format!("church {} has no builtin admin role", church.id)),
            Some(role) => {
                let holders = self
                    .assignment_repo
                    .count_role_users(church.id, role.id)
                    .await
                    .map_err(wrap)?;
                if holders == 0 {
                    validation
                        .issues
                        .push(format!("church {} has no admin role holder", church.id));
                }
            }
        }

        for user in self.legacy_repo.list_all().await.map_err(wrap)? {
            let membership = self
                .membership_repo
                .find_by_user(church.id, user.id)
                .await
                .map_err(wrap)?;
            match membership {
                None => validation
                    .issues
                    .push(format!("legacy user {} has no membership", user.id)),
                Some(m) if !m.is_active() => validation
                    .issues
                    .push(format!("legacy user {} membership is not Active", user.id)),
                Some(_) => {}
            }
        }

        for collection in BACKFILL_COLLECTIONS {
            let missing = self
                .legacy_repo
                .count_missing_church_id(collection)
                .await
                .map_err(wrap)?;
            if missing > 0 {
                validation.issues.push(format!(
                    "{missing} record(s) in '{collection}' still lack a church_id"
                ));
            }
        }

        Ok(validation)
    }
}
