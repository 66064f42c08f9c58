//! SurrealDB implementation of [`LegacyRepository`].
//!
//! The legacy collections are SCHEMALESS — they hold whatever shape
//! the pre-tenant installation left behind. Reads project explicit
//! columns so missing fields surface as `None`, and the backfill
//! matches records whose `church_id` is absent (`= NONE`).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::legacy::{CreateLegacyUser, LegacyUser};
use vestry_core::repository::LegacyRepository;

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::parse_uuid;

/// Collections the migration is allowed to touch. Table names cannot
/// be bound as query parameters, so anything else is rejected before
/// it reaches a formatted query.
const LEGACY_COLLECTIONS: &[&str] = &["song", "service", "category", "label"];

/// Record id of the single advisory migration lock.
const MIGRATION_LOCK_ID: &str = "legacy_migration";

fn check_collection(collection: &str) -> VestryResult<()> {
    if LEGACY_COLLECTIONS.contains(&collection) {
        Ok(())
    } else {
        Err(VestryError::Internal(format!(
            "unknown legacy collection: {collection}"
        )))
    }
}

#[derive(Debug, SurrealValue)]
struct LegacyUserRow {
    record_id: String,
    email: Option<String>,
    role: Option<String>,
    church_name: Option<String>,
}

impl LegacyUserRow {
    fn try_into_legacy_user(self) -> Result<LegacyUser, DbError> {
        Ok(LegacyUser {
            id: parse_uuid("record", &self.record_id)?,
            email: self.email,
            role: self.role,
            church_name: self.church_name,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Legacy repository.
#[derive(Clone)]
pub struct SurrealLegacyRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealLegacyRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> LegacyRepository for SurrealLegacyRepository<C> {
    async fn create(&self, input: CreateLegacyUser) -> VestryResult<LegacyUser> {
        let id = Uuid::new_v4();

        self.db
            .query(
                "CREATE type::record('legacy_user', $id) SET \
                 email = $email, role = $role, \
                 church_name = $church_name",
            )
            .bind(("id", id.to_string()))
            .bind(("email", input.email.clone()))
            .bind(("role", input.role.clone()))
            .bind(("church_name", input.church_name.clone()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(LegacyUser {
            id,
            email: input.email,
            role: input.role,
            church_name: input.church_name,
        })
    }

    async fn list_all(&self) -> VestryResult<Vec<LegacyUser>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, email, role, \
                 church_name FROM legacy_user",
            )
            .await
            .map_err(DbError::from)?;

        let rows: Vec<LegacyUserRow> = result.take(0).map_err(DbError::from)?;

        let users = rows
            .into_iter()
            .map(|row| row.try_into_legacy_user())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(users)
    }

    async fn count(&self) -> VestryResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM legacy_user GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn count_missing_church_id(&self, collection: &str) -> VestryResult<u64> {
        check_collection(collection)?;

        let query = format!(
            "SELECT count() AS total FROM {collection} \
             WHERE church_id = NONE GROUP ALL"
        );

        let mut result = self.db.query(query).await.map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn backfill_church_id(
        &self,
        collection: &str,
        church_id: Uuid,
        set_visibility: bool,
    ) -> VestryResult<u64> {
        check_collection(collection)?;

        let pending = self.count_missing_church_id(collection).await?;
        if pending == 0 {
            return Ok(0);
        }

        let query = if set_visibility {
            format!(
                "UPDATE {collection} SET church_id = $church_id, \
                 visibility = 'church' WHERE church_id = NONE"
            )
        } else {
            format!("UPDATE {collection} SET church_id = $church_id WHERE church_id = NONE")
        };

        self.db
            .query(query)
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        Ok(pending)
    }

    async fn try_acquire_migration_lock(&self) -> VestryResult<bool> {
        let result = self
            .db
            .query(
                "CREATE type::record('op_lock', $id) SET \
                 acquired_at = time::now()",
            )
            .bind(("id", MIGRATION_LOCK_ID))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => Ok(true),
            Err(e) if is_unique_violation(&e.to_string()) => Ok(false),
            Err(e) => Err(DbError::Migration(e.to_string()).into()),
        }
    }

    async fn release_migration_lock(&self) -> VestryResult<()> {
        self.db
            .query("DELETE type::record('op_lock', $id)")
            .bind(("id", MIGRATION_LOCK_ID))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }
}
