//! Integration tests for church creation and the bootstrap hooks
//! using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::{Db as LocalDb, Mem};
use uuid::Uuid;
use vestry_core::models::membership::MembershipStatus;
use vestry_core::models::permission::Permission;
use vestry_core::repository::RoleRepository;
use vestry_core::repository::SkillRepository;
use vestry_db::repository::{
    SurrealAssignmentRepository, SurrealChurchRepository, SurrealMembershipRepository,
    SurrealRoleRepository, SurrealSkillRepository,
};
use vestry_tenancy::assignments::AssignmentService;
use vestry_tenancy::bootstrap::Bootstrap;
use vestry_tenancy::churches::ChurchService;
use vestry_tenancy::config::TenancyConfig;
use vestry_tenancy::memberships::MembershipService;

type Churches = ChurchService<
    SurrealChurchRepository<LocalDb>,
    SurrealRoleRepository<LocalDb>,
    SurrealSkillRepository<LocalDb>,
    SurrealAssignmentRepository<LocalDb>,
>;
type Memberships = MembershipService<
    SurrealChurchRepository<LocalDb>,
    SurrealMembershipRepository<LocalDb>,
    SurrealRoleRepository<LocalDb>,
    SurrealSkillRepository<LocalDb>,
    SurrealAssignmentRepository<LocalDb>,
>;
type Assignments = AssignmentService<
    SurrealChurchRepository<LocalDb>,
    SurrealMembershipRepository<LocalDb>,
    SurrealAssignmentRepository<LocalDb>,
>;

async fn setup() -> (Surreal<LocalDb>, Churches, Memberships, Assignments) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();

    let church_repo = SurrealChurchRepository::new(db.clone());
    let membership_repo = SurrealMembershipRepository::new(db.clone());
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
    let memberships = MembershipService::new(
        church_repo.clone(),
        membership_repo.clone(),
        role_repo.clone(),
        assignment_repo.clone(),
        Bootstrap::new(
            church_repo.clone(),
            role_repo,
            skill_repo,
            assignment_repo.clone(),
            TenancyConfig::default(),
        ),
        TenancyConfig::default(),
    );
    let assignments = AssignmentService::new(church_repo, membership_repo, assignment_repo);

    (db, churches, memberships, assignments)
}

#[tokio::test]
async fn create_church_seeds_builtin_admin_and_leader() {
    let (db, churches, _, _) = setup().await;

    let church = churches
        .create_church("Grace Community", Uuid::new_v4(), None, None)
        .await
        .unwrap();
    assert_eq!(church.slug, "grace-community");

    let role_repo = SurrealRoleRepository::new(db.clone());
    let admin = role_repo
        .find_by_slug(church.id, "admin")
        .await
        .unwrap()
        .expect("admin role should be seeded");
    assert!(admin.is_builtin);
    assert_eq!(admin.permissions, Permission::catalog());

    let skill_repo = SurrealSkillRepository::new(db);
    let leader = skill_repo
        .find_by_slug(church.id, "leader")
        .await
        .unwrap()
        .expect("leader skill should be seeded");
    assert!(leader.is_builtin);

    // Exactly one of each.
    let roles = role_repo.list_all(church.id).await.unwrap();
    assert_eq!(roles.iter().filter(|r| r.slug == "admin").count(), 1);
    let skills = skill_repo.list_all(church.id).await.unwrap();
    assert_eq!(skills.iter().filter(|s| s.slug == "leader").count(), 1);
}

#[tokio::test]
async fn rerunning_the_church_trigger_is_idempotent() {
    let (db, churches, _, _) = setup().await;

    let church = churches
        .create_church("Grace", Uuid::new_v4(), None, None)
        .await
        .unwrap();

    let church_repo = SurrealChurchRepository::new(db.clone());
    let role_repo = SurrealRoleRepository::new(db.clone());
    let skill_repo = SurrealSkillRepository::new(db.clone());
    let assignment_repo = SurrealAssignmentRepository::new(db.clone());
    let bootstrap = Bootstrap::new(
        church_repo,
        role_repo.clone(),
        skill_repo.clone(),
        assignment_repo,
        TenancyConfig::default(),
    );

    // At-least-once delivery: a repeat trigger changes nothing.
    bootstrap.on_church_created(church.id).await;
    bootstrap.on_church_created(church.id).await;

    assert_eq!(role_repo.list_all(church.id).await.unwrap().len(), 1);
    assert_eq!(skill_repo.list_all(church.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn owner_membership_resolves_to_full_catalog() {
    let (_db, churches, memberships, assignments) = setup().await;

    let owner = Uuid::new_v4();
    let church = churches
        .create_church("Grace", owner, None, None)
        .await
        .unwrap();

    memberships
        .create_membership(church.id, owner, MembershipStatus::Active)
        .await
        .unwrap();

    let perms = assignments
        .resolve_permissions(church.id, owner)
        .await
        .unwrap();
    assert_eq!(perms, Permission::catalog());

    let skills = assignments.resolve_skills(church.id, owner).await.unwrap();
    assert!(skills.iter().any(|s| s.slug == "leader"));
}

#[tokio::test]
async fn non_owner_membership_is_not_promoted() {
    let (_db, churches, memberships, assignments) = setup().await;

    let church = churches
        .create_church("Grace", Uuid::new_v4(), None, None)
        .await
        .unwrap();

    let member = Uuid::new_v4();
    memberships
        .create_membership(church.id, member, MembershipStatus::Active)
        .await
        .unwrap();

    let perms = assignments
        .resolve_permissions(church.id, member)
        .await
        .unwrap();
    assert!(perms.is_empty());
}

#[tokio::test]
async fn unsluggable_church_name_is_rejected() {
    let (_db, churches, _, _) = setup().await;

    let result = churches.create_church("!!!", Uuid::new_v4(), None, None).await;
    assert!(result.is_err());
}
