//! Integration tests for the role/skill registry using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db as LocalDb, Mem};
use uuid::Uuid;
use vestry_core::error::VestryError;
use vestry_core::models::church::Church;
use vestry_core::models::permission::Permission;
use vestry_core::models::role::UpdateRole;
use vestry_core::repository::{AssignmentRepository, ChurchRepository, RoleRepository};
use vestry_db::repository::{
    SurrealAssignmentRepository, SurrealChurchRepository, SurrealRoleRepository,
    SurrealSkillRepository,
};
use vestry_tenancy::bootstrap::Bootstrap;
use vestry_tenancy::churches::ChurchService;
use vestry_tenancy::config::TenancyConfig;
use vestry_tenancy::registry::RegistryService;

type Registry = RegistryService<
    SurrealChurchRepository<LocalDb>,
    SurrealRoleRepository<LocalDb>,
    SurrealSkillRepository<LocalDb>,
    SurrealAssignmentRepository<LocalDb>,
>;

async fn setup() -> (Surreal<LocalDb>, Registry, Church) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();

    let church_repo = SurrealChurchRepository::new(db.clone());
    let role_repo = SurrealRoleRepository::new(db.clone());
    let skill_repo = SurrealSkillRepository::new(db.clone());
    let assignment_repo = SurrealAssignmentRepository::new(db.clone());

    let churches = ChurchService::new(
        church_repo.clone(),
        Bootstrap::new(
            church_repo.clone(),
            role_repo.clone(),
            skill_repo.clone(),
            assignment_repo.clone(),
            TenancyConfig::default(),
        ),
        TenancyConfig::default(),
    );
    let church = churches
        .create_church("Grace", Uuid::new_v4(), None, None)
        .await
        .unwrap();

    let registry = RegistryService::new(church_repo, role_repo, skill_repo, assignment_repo);

    (db, registry, church)
}

#[tokio::test]
async fn create_role_parses_permission_strings() {
    let (_db, registry, church) = setup().await;

    let role = registry
        .create_role(
            church.id,
            "Worship Leader",
            &["manage-songs".into(), "manage-services".into()],
        )
        .await
        .unwrap();

    assert_eq!(role.slug, "worship-leader");
    assert!(role.permissions.contains(&Permission::ManageSongs));
    assert!(role.permissions.contains(&Permission::ManageServices));
    assert!(!role.is_builtin);
}

#[tokio::test]
async fn unknown_permission_string_is_rejected() {
    let (_db, registry, church) = setup().await;

    let err = registry
        .create_role(church.id, "Treasurer", &["manage-finances".into()])
        .await
        .unwrap_err();

    assert!(
        matches!(err, VestryError::InvalidPermission { ref permission } if permission == "manage-finances"),
        "expected InvalidPermission, got {err:?}"
    );
}

#[tokio::test]
async fn role_slug_is_immutable() {
    let (_db, registry, church) = setup().await;

    let role = registry
        .create_role(church.id, "Tech", &[])
        .await
        .unwrap();

    let err = registry
        .update_role(
            church.id,
            role.id,
            UpdateRole {
                slug: Some("tech-team".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert!(matches!(err, VestryError::ImmutableSlug { .. }));
}

#[tokio::test]
async fn builtin_role_cannot_lose_all_permissions() {
    let (db, registry, church) = setup().await;

    let role_repo = SurrealRoleRepository::new(db);
    let admin = role_repo
        .find_by_slug(church.id, "admin")
        .await
        .unwrap()
        .unwrap();

    let err = registry
        .update_role(
            church.id,
            admin.id,
            UpdateRole {
                permissions: Some(Default::default()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, VestryError::BuiltinProtected { .. }));

    // Renaming a builtin is fine.
    let renamed = registry
        .update_role(
            church.id,
            admin.id,
            UpdateRole {
                name: Some("Admins".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Admins");
}

#[tokio::test]
async fn delete_role_guards() {
    let (db, registry, church) = setup().await;

    let role_repo = SurrealRoleRepository::new(db.clone());
    let assignment_repo = SurrealAssignmentRepository::new(db);

    // Builtins are undeletable.
    let admin = role_repo
        .find_by_slug(church.id, "admin")
        .await
        .unwrap()
        .unwrap();
    let err = registry.delete_role(church.id, admin.id).await.unwrap_err();
    assert!(matches!(err, VestryError::BuiltinProtected { .. }));

    // An assigned role is refused with the holder count.
    let role = registry
        .create_role(church.id, "Tech", &[])
        .await
        .unwrap();
    let user_id = Uuid::new_v4();
    assignment_repo
        .assign_role(church.id, user_id, role.id)
        .await
        .unwrap();

    let err = registry.delete_role(church.id, role.id).await.unwrap_err();
    assert!(
        matches!(err, VestryError::RoleInUse { assigned_users: 1, .. }),
        "expected RoleInUse with one holder, got {err:?}"
    );

    // After unassignment the delete goes through.
    assignment_repo
        .unassign_role(church.id, user_id, role.id)
        .await
        .unwrap();
    registry.delete_role(church.id, role.id).await.unwrap();
}

#[tokio::test]
async fn coverage_reports_ungranted_permissions() {
    let (db, registry, church) = setup().await;

    // The builtin admin covers everything.
    assert!(registry
        .validate_permission_coverage(church.id)
        .await
        .unwrap()
        .is_empty());

    // A church whose roles grant only manage-songs is missing the rest.
    let bare_church = Uuid::new_v4();
    let role_repo = SurrealRoleRepository::new(db);
    role_repo
        .create(vestry_core::models::role::CreateRole {
            church_id: bare_church,
            name: "Songs Only".into(),
            slug: "songs-only".into(),
            permissions: [Permission::ManageSongs].into_iter().collect(),
            is_builtin: false,
        })
        .await
        .unwrap();

    let missing = registry
        .validate_permission_coverage(bare_church)
        .await
        .unwrap();
    assert_eq!(
        missing,
        vec![
            Permission::ManageServices,
            Permission::ManageMembers,
            Permission::ManageChurch,
        ]
    );
}

#[tokio::test]
async fn writes_are_blocked_on_a_deactivated_church() {
    let (db, registry, church) = setup().await;

    SurrealChurchRepository::new(db)
        .set_active(church.id, false)
        .await
        .unwrap();

    let err = registry
        .create_role(church.id, "Tech", &[])
        .await
        .unwrap_err();
    assert!(
        matches!(err, VestryError::TenantInactive { church_id } if church_id == church.id),
        "expected TenantInactive, got {err:?}"
    );

    let err = registry
        .create_skill(church.id, "Vocalist")
        .await
        .unwrap_err();
    assert!(matches!(err, VestryError::TenantInactive { .. }));
}
