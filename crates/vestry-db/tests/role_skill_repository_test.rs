//! Integration tests for the Role and Skill repositories using
//! in-memory SurrealDB.

use std::collections::BTreeSet;

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vestry_core::error::VestryError;
use vestry_core::models::permission::Permission;
use vestry_core::models::role::{CreateRole, UpdateRole};
use vestry_core::models::skill::{CreateSkill, UpdateSkill};
use vestry_core::repository::{
    AssignmentRepository, Pagination, RoleRepository, SkillRepository,
};
use vestry_db::repository::{
    SurrealAssignmentRepository, SurrealRoleRepository, SurrealSkillRepository,
};

async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();
    (db, Uuid::new_v4())
}

fn role_input(church_id: Uuid, name: &str, slug: &str) -> CreateRole {
    CreateRole {
        church_id,
        name: name.into(),
        slug: slug.into(),
        permissions: [Permission::ManageSongs].into_iter().collect(),
        is_builtin: false,
    }
}

#[tokio::test]
async fn create_and_get_role() {
    let (db, church_id) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo
        .create(role_input(church_id, "Worship Leader", "worship-leader"))
        .await
        .unwrap();

    assert_eq!(role.church_id, church_id);
    assert_eq!(role.slug, "worship-leader");
    assert!(role.permissions.contains(&Permission::ManageSongs));
    assert!(!role.is_builtin);

    let fetched = repo.get_by_id(church_id, role.id).await.unwrap();
    assert_eq!(fetched.id, role.id);
}

#[tokio::test]
async fn find_role_by_slug() {
    let (db, church_id) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo
        .create(role_input(church_id, "Member", "member"))
        .await
        .unwrap();

    let found = repo.find_by_slug(church_id, "member").await.unwrap();
    assert_eq!(found.map(|r| r.id), Some(role.id));

    let missing = repo.find_by_slug(church_id, "ghost").await.unwrap();
    assert!(missing.is_none());

    // Same slug in another church does not leak across tenants.
    let other_church = repo.find_by_slug(Uuid::new_v4(), "member").await.unwrap();
    assert!(other_church.is_none());
}

#[tokio::test]
async fn duplicate_role_slug_rejected_per_church() {
    let (db, church_id) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    repo.create(role_input(church_id, "Member", "member"))
        .await
        .unwrap();
    let err = repo
        .create(role_input(church_id, "Member Two", "member"))
        .await
        .unwrap_err();
    assert!(matches!(err, VestryError::DuplicateSlug { .. }));

    // The same slug is fine in a different church.
    repo.create(role_input(Uuid::new_v4(), "Member", "member"))
        .await
        .unwrap();
}

#[tokio::test]
async fn update_role_name_and_permissions() {
    let (db, church_id) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    let role = repo
        .create(role_input(church_id, "Tech", "tech"))
        .await
        .unwrap();

    let new_perms: BTreeSet<Permission> = [Permission::ManageSongs, Permission::ManageServices]
        .into_iter()
        .collect();
    let updated = repo
        .update(
            church_id,
            role.id,
            UpdateRole {
                name: Some("Tech Team".into()),
                permissions: Some(new_perms.clone()),
                slug: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Tech Team");
    assert_eq!(updated.permissions, new_perms);
    assert_eq!(updated.slug, "tech"); // unchanged
}

#[tokio::test]
async fn delete_role_removes_its_assignments() {
    let (db, church_id) = setup().await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    let assignment_repo = SurrealAssignmentRepository::new(db);

    let role = role_repo
        .create(role_input(church_id, "Tech", "tech"))
        .await
        .unwrap();
    let user_id = Uuid::new_v4();
    assignment_repo
        .assign_role(church_id, user_id, role.id)
        .await
        .unwrap();

    role_repo.delete(church_id, role.id).await.unwrap();

    assert!(role_repo.get_by_id(church_id, role.id).await.is_err());
    let roles = assignment_repo
        .roles_for_user(church_id, user_id)
        .await
        .unwrap();
    assert!(roles.is_empty(), "assignments should not survive the role");
}

#[tokio::test]
async fn list_roles_with_pagination() {
    let (db, church_id) = setup().await;
    let repo = SurrealRoleRepository::new(db);

    for i in 0..4 {
        repo.create(role_input(church_id, &format!("Role {i}"), &format!("role-{i}")))
            .await
            .unwrap();
    }

    let page = repo
        .list(
            church_id,
            Pagination {
                offset: 0,
                limit: 3,
            },
        )
        .await
        .unwrap();
    assert_eq!(page.items.len(), 3);
    assert_eq!(page.total, 4);

    let all = repo.list_all(church_id).await.unwrap();
    assert_eq!(all.len(), 4);
}

#[tokio::test]
async fn create_update_and_delete_skill() {
    let (db, church_id) = setup().await;
    let repo = SurrealSkillRepository::new(db);

    let skill = repo
        .create(CreateSkill {
            church_id,
            name: "Vocalist".into(),
            slug: "vocalist".into(),
            is_builtin: false,
        })
        .await
        .unwrap();
    assert_eq!(skill.slug, "vocalist");

    let err = repo
        .create(CreateSkill {
            church_id,
            name: "Vocalist Two".into(),
            slug: "vocalist".into(),
            is_builtin: false,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, VestryError::DuplicateSlug { .. }));

    let updated = repo
        .update(
            church_id,
            skill.id,
            UpdateSkill {
                name: Some("Lead Vocalist".into()),
                slug: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name, "Lead Vocalist");

    repo.delete(church_id, skill.id).await.unwrap();
    assert!(repo.find_by_slug(church_id, "vocalist").await.unwrap().is_none());
}
