//! Integration tests for the Membership and Assignment repositories
//! using in-memory SurrealDB.

use std::collections::BTreeSet;

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vestry_core::error::VestryError;
use vestry_core::models::membership::{CreateMembership, MembershipStatus, UpdateMembership};
use vestry_core::models::permission::Permission;
use vestry_core::models::role::CreateRole;
use vestry_core::models::skill::CreateSkill;
use vestry_core::repository::{
    AssignmentRepository, MembershipRepository, RoleRepository, SkillRepository,
};
use vestry_db::repository::{
    SurrealAssignmentRepository, SurrealMembershipRepository, SurrealRoleRepository,
    SurrealSkillRepository,
};

async fn setup() -> (Surreal<surrealdb::engine::local::Db>, Uuid, Uuid) {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();
    (db, Uuid::new_v4(), Uuid::new_v4())
}

#[tokio::test]
async fn create_and_find_membership() {
    let (db, church_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db);

    let membership = repo
        .create(CreateMembership {
            church_id,
            user_id,
            status: MembershipStatus::Active,
        })
        .await
        .unwrap();

    assert_eq!(membership.church_id, church_id);
    assert_eq!(membership.user_id, user_id);
    assert!(membership.is_active());
    assert!(membership.permissions_override.is_none());
    assert!(membership.preferred_keys.is_empty());

    let found = repo.find_by_user(church_id, user_id).await.unwrap();
    assert_eq!(found.map(|m| m.id), Some(membership.id));

    let missing = repo.find_by_user(church_id, Uuid::new_v4()).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn duplicate_membership_rejected() {
    let (db, church_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db);

    repo.create(CreateMembership {
        church_id,
        user_id,
        status: MembershipStatus::Invited,
    })
    .await
    .unwrap();

    let err = repo
        .create(CreateMembership {
            church_id,
            user_id,
            status: MembershipStatus::Active,
        })
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            VestryError::DuplicateMembership {
                church_id: c,
                user_id: u,
            } if c == church_id && u == user_id
        ),
        "expected DuplicateMembership, got {err:?}"
    );
}

#[tokio::test]
async fn status_transitions_persist() {
    let (db, church_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db);

    let membership = repo
        .create(CreateMembership {
            church_id,
            user_id,
            status: MembershipStatus::Invited,
        })
        .await
        .unwrap();
    assert_eq!(membership.status, MembershipStatus::Invited);

    let active = repo
        .set_status(church_id, membership.id, MembershipStatus::Active)
        .await
        .unwrap();
    assert!(active.is_active());

    let inactive = repo
        .set_status(church_id, membership.id, MembershipStatus::Inactive)
        .await
        .unwrap();
    assert_eq!(inactive.status, MembershipStatus::Inactive);

    // The record survives removal.
    assert!(repo.get_by_id(church_id, membership.id).await.is_ok());
}

#[tokio::test]
async fn permissions_override_set_and_clear() {
    let (db, church_id, user_id) = setup().await;
    let repo = SurrealMembershipRepository::new(db);

    let membership = repo
        .create(CreateMembership {
            church_id,
            user_id,
            status: MembershipStatus::Active,
        })
        .await
        .unwrap();

    let override_set: BTreeSet<Permission> = [Permission::ManageSongs].into_iter().collect();
    let updated = repo
        .update(
            church_id,
            membership.id,
            UpdateMembership {
                permissions_override: Some(Some(override_set.clone())),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.permissions_override, Some(override_set));

    let cleared = repo
        .update(
            church_id,
            membership.id,
            UpdateMembership {
                permissions_override: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert!(cleared.permissions_override.is_none());
}

#[tokio::test]
async fn list_active_for_user_spans_churches() {
    let (db, church_a, user_id) = setup().await;
    let church_b = Uuid::new_v4();
    let repo = SurrealMembershipRepository::new(db);

    repo.create(CreateMembership {
        church_id: church_a,
        user_id,
        status: MembershipStatus::Active,
    })
    .await
    .unwrap();
    repo.create(CreateMembership {
        church_id: church_b,
        user_id,
        status: MembershipStatus::Active,
    })
    .await
    .unwrap();
    // Invited does not count as active.
    repo.create(CreateMembership {
        church_id: Uuid::new_v4(),
        user_id,
        status: MembershipStatus::Invited,
    })
    .await
    .unwrap();

    let active = repo.list_active_for_user(user_id).await.unwrap();
    assert_eq!(active.len(), 2);

    assert_eq!(repo.count_active(church_a).await.unwrap(), 1);
}

#[tokio::test]
async fn assign_role_is_idempotent() {
    let (db, church_id, user_id) = setup().await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    let repo = SurrealAssignmentRepository::new(db);

    let role = role_repo
        .create(CreateRole {
            church_id,
            name: "Member".into(),
            slug: "member".into(),
            permissions: BTreeSet::new(),
            is_builtin: false,
        })
        .await
        .unwrap();

    let first = repo.assign_role(church_id, user_id, role.id).await.unwrap();
    let second = repo.assign_role(church_id, user_id, role.id).await.unwrap();

    assert_eq!(first.id, second.id, "repeat assignment returns the same row");
    assert_eq!(repo.count_role_users(church_id, role.id).await.unwrap(), 1);
}

#[tokio::test]
async fn unassign_role_is_noop_when_absent() {
    let (db, church_id, user_id) = setup().await;
    let repo = SurrealAssignmentRepository::new(db);

    repo.unassign_role(church_id, user_id, Uuid::new_v4())
        .await
        .unwrap();
}

#[tokio::test]
async fn roles_and_skills_resolve_per_user() {
    let (db, church_id, user_id) = setup().await;
    let role_repo = SurrealRoleRepository::new(db.clone());
    let skill_repo = SurrealSkillRepository::new(db.clone());
    let repo = SurrealAssignmentRepository::new(db);

    let role = role_repo
        .create(CreateRole {
            church_id,
            name: "Leader".into(),
            slug: "leader".into(),
            permissions: [Permission::ManageServices].into_iter().collect(),
            is_builtin: false,
        })
        .await
        .unwrap();
    let skill = skill_repo
        .create(CreateSkill {
            church_id,
            name: "Drummer".into(),
            slug: "drummer".into(),
            is_builtin: false,
        })
        .await
        .unwrap();

    repo.assign_role(church_id, user_id, role.id).await.unwrap();
    repo.assign_skill(church_id, user_id, skill.id).await.unwrap();

    let roles = repo.roles_for_user(church_id, user_id).await.unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0].slug, "leader");

    let skills = repo.skills_for_user(church_id, user_id).await.unwrap();
    assert_eq!(skills.len(), 1);
    assert_eq!(skills[0].slug, "drummer");

    // Another user in the same church resolves to nothing.
    let other = repo.roles_for_user(church_id, Uuid::new_v4()).await.unwrap();
    assert!(other.is_empty());

    let holders = repo.users_with_role(church_id, role.id).await.unwrap();
    assert_eq!(holders, vec![user_id]);

    repo.unassign_skill(church_id, user_id, skill.id).await.unwrap();
    assert_eq!(repo.count_skill_users(church_id, skill.id).await.unwrap(), 0);
}
