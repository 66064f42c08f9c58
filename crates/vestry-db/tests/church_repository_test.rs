//! Integration tests for the Church repository using in-memory SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vestry_core::error::VestryError;
use vestry_core::models::church::{CreateChurch, SubscriptionTier, UpdateChurch};
use vestry_core::repository::{ChurchRepository, Pagination};
use vestry_db::repository::SurrealChurchRepository;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();
    db
}

fn create_input(name: &str, slug: &str) -> CreateChurch {
    CreateChurch {
        name: name.into(),
        slug: slug.into(),
        owner_user_id: Uuid::new_v4(),
        tier: SubscriptionTier::Free,
        settings: None,
    }
}

#[tokio::test]
async fn create_and_get_church() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    let church = repo
        .create(create_input("Grace Community", "grace-community"))
        .await
        .unwrap();

    assert_eq!(church.name, "Grace Community");
    assert_eq!(church.slug, "grace-community");
    assert_eq!(church.tier, SubscriptionTier::Free);
    assert!(church.is_active);

    let by_id = repo.get_by_id(church.id).await.unwrap();
    assert_eq!(by_id.id, church.id);
    assert_eq!(by_id.owner_user_id, church.owner_user_id);

    let by_slug = repo.get_by_slug("grace-community").await.unwrap();
    assert_eq!(by_slug.id, church.id);
}

#[tokio::test]
async fn duplicate_slug_rejected() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    repo.create(create_input("Grace", "grace")).await.unwrap();
    let err = repo
        .create(create_input("Grace Two", "grace"))
        .await
        .unwrap_err();

    assert!(
        matches!(err, VestryError::DuplicateSlug { ref slug, .. } if slug == "grace"),
        "expected DuplicateSlug, got {err:?}"
    );
}

#[tokio::test]
async fn update_church_leaves_slug_untouched() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    let church = repo.create(create_input("Grace", "grace")).await.unwrap();

    let updated = repo
        .update(
            church.id,
            UpdateChurch {
                name: Some("Grace Chapel".into()),
                tier: Some(SubscriptionTier::Standard),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.name, "Grace Chapel");
    assert_eq!(updated.tier, SubscriptionTier::Standard);
    assert_eq!(updated.slug, "grace"); // unchanged
}

#[tokio::test]
async fn deactivation_is_soft() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    let church = repo.create(create_input("Grace", "grace")).await.unwrap();
    repo.set_active(church.id, false).await.unwrap();

    // The record survives; only the flag flips.
    let fetched = repo.get_by_id(church.id).await.unwrap();
    assert!(!fetched.is_active);

    repo.set_active(church.id, true).await.unwrap();
    assert!(repo.get_by_id(church.id).await.unwrap().is_active);
}

#[tokio::test]
async fn set_active_on_missing_church_fails() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    let result = repo.set_active(Uuid::new_v4(), false).await;
    assert!(result.is_err(), "missing church should not be found");
}

#[tokio::test]
async fn count_and_list_with_pagination() {
    let db = setup().await;
    let repo = SurrealChurchRepository::new(db);

    assert_eq!(repo.count().await.unwrap(), 0);

    for i in 0..5 {
        repo.create(create_input(&format!("Church {i}"), &format!("church-{i}")))
            .await
            .unwrap();
    }

    assert_eq!(repo.count().await.unwrap(), 5);

    let page1 = repo
        .list(Pagination {
            offset: 0,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page1.items.len(), 3);
    assert_eq!(page1.total, 5);

    let page2 = repo
        .list(Pagination {
            offset: 3,
            limit: 3,
        })
        .await
        .unwrap();
    assert_eq!(page2.items.len(), 2);
}
