//! Integration tests for the Legacy repository using in-memory
//! SurrealDB.

use surrealdb::Surreal;
use surrealdb::engine::local::Mem;
use uuid::Uuid;
use vestry_core::models::legacy::CreateLegacyUser;
use vestry_core::repository::LegacyRepository;
use vestry_db::repository::SurrealLegacyRepository;

async fn setup() -> Surreal<surrealdb::engine::local::Db> {
    let db = Surreal::new::<Mem>(()).await.unwrap();
    db.use_ns("test").use_db("test").await.unwrap();
    vestry_db::run_migrations(&db).await.unwrap();
    db
}

#[tokio::test]
async fn create_and_list_legacy_users() {
    let db = setup().await;
    let repo = SurrealLegacyRepository::new(db);

    assert_eq!(repo.count().await.unwrap(), 0);

    repo.create(CreateLegacyUser {
        email: Some("pat@example.com".into()),
        role: Some("admin".into()),
        church_name: Some("Grace".into()),
    })
    .await
    .unwrap();
    // Sparse legacy records are the norm, not the exception.
    repo.create(CreateLegacyUser::default()).await.unwrap();

    let users = repo.list_all().await.unwrap();
    assert_eq!(users.len(), 2);
    assert_eq!(repo.count().await.unwrap(), 2);

    let sparse = users.iter().find(|u| u.email.is_none()).unwrap();
    assert!(sparse.role.is_none());
    assert!(sparse.church_name.is_none());
}

#[tokio::test]
async fn backfill_stamps_only_untagged_records() {
    let db = setup().await;
    let repo = SurrealLegacyRepository::new(db.clone());
    let church_id = Uuid::new_v4();

    db.query("CREATE song SET title = 'Amazing Grace'")
        .await
        .unwrap()
        .check()
        .unwrap();
    db.query("CREATE song SET title = 'How Great', church_id = $cid")
        .bind(("cid", Uuid::new_v4().to_string()))
        .await
        .unwrap()
        .check()
        .unwrap();

    assert_eq!(repo.count_missing_church_id("song").await.unwrap(), 1);

    let stamped = repo
        .backfill_church_id("song", church_id, true)
        .await
        .unwrap();
    assert_eq!(stamped, 1);
    assert_eq!(repo.count_missing_church_id("song").await.unwrap(), 0);

    // Already-tagged records keep their visibility untouched; the
    // stamped one got the safe default.
    let mut result = db
        .query("SELECT count() AS total FROM song WHERE visibility = 'church' GROUP ALL")
        .await
        .unwrap();
    let counts: Vec<surrealdb_types::Value> = result.take(0).unwrap();
    assert!(format!("{counts:?}").contains('1'), "expected one song with visibility 'church'");

    // Re-running finds nothing left to stamp.
    let again = repo
        .backfill_church_id("song", church_id, true)
        .await
        .unwrap();
    assert_eq!(again, 0);
}

#[tokio::test]
async fn unknown_collection_is_rejected() {
    let db = setup().await;
    let repo = SurrealLegacyRepository::new(db);

    let result = repo.count_missing_church_id("user; REMOVE TABLE song").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn migration_lock_is_exclusive() {
    let db = setup().await;
    let repo = SurrealLegacyRepository::new(db);

    assert!(repo.try_acquire_migration_lock().await.unwrap());
    assert!(
        !repo.try_acquire_migration_lock().await.unwrap(),
        "second acquisition must fail while the lock is held"
    );

    repo.release_migration_lock().await.unwrap();
    assert!(repo.try_acquire_migration_lock().await.unwrap());
}
