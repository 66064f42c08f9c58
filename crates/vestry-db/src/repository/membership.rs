//! SurrealDB implementation of [`MembershipRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::membership::{
    ChurchMembership, CreateMembership, MembershipStatus, UpdateMembership,
};
use vestry_core::repository::{MembershipRepository, PaginatedResult, Pagination};

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::{parse_perms, parse_uuid, perms_to_strings};

fn parse_status(s: &str) -> Result<MembershipStatus, DbError> {
    match s {
        "Invited" => Ok(MembershipStatus::Invited),
        "Active" => Ok(MembershipStatus::Active),
        "Inactive" => Ok(MembershipStatus::Inactive),
        other => Err(DbError::Migration(format!(
            "unknown membership status: {other}"
        ))),
    }
}

fn status_to_string(s: &MembershipStatus) -> &'static str {
    match s {
        MembershipStatus::Invited => "Invited",
        MembershipStatus::Active => "Active",
        MembershipStatus::Inactive => "Inactive",
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct MembershipRow {
    church_id: String,
    user_id: String,
    status: String,
    permissions_override: Option<Vec<String>>,
    preferred_keys: Vec<String>,
    notification_preferences: serde_json::Value,
    joined_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRow {
    fn into_membership(self, id: Uuid) -> Result<ChurchMembership, DbError> {
        Ok(ChurchMembership {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            status: parse_status(&self.status)?,
            permissions_override: self.permissions_override.map(parse_perms).transpose()?,
            preferred_keys: self.preferred_keys,
            notification_preferences: self.notification_preferences,
            joined_date: self.joined_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct MembershipRowWithId {
    record_id: String,
    church_id: String,
    user_id: String,
    status: String,
    permissions_override: Option<Vec<String>>,
    preferred_keys: Vec<String>,
    notification_preferences: serde_json::Value,
    joined_date: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl MembershipRowWithId {
    fn try_into_membership(self) -> Result<ChurchMembership, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(ChurchMembership {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            status: parse_status(&self.status)?,
            permissions_override: self.permissions_override.map(parse_perms).transpose()?,
            preferred_keys: self.preferred_keys,
            notification_preferences: self.notification_preferences,
            joined_date: self.joined_date,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Membership repository.
#[derive(Clone)]
pub struct SurrealMembershipRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealMembershipRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> MembershipRepository for SurrealMembershipRepository<C> {
    async fn create(&self, input: CreateMembership) -> VestryResult<ChurchMembership> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "CREATE type::record('membership', $id) SET \
                 church_id = $church_id, user_id = $user_id, \
                 status = $status",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", input.church_id.to_string()))
            .bind(("user_id", input.user_id.to_string()))
            .bind(("status", status_to_string(&input.status)))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e.to_string()) => {
                return Err(VestryError::DuplicateMembership {
                    church_id: input.church_id,
                    user_id: input.user_id,
                });
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        };

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn get_by_id(&self, church_id: Uuid, id: Uuid) -> VestryResult<ChurchMembership> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('membership', $id) \
                 WHERE church_id = $church_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn find_by_user(
        &self,
        church_id: Uuid,
        user_id: Uuid,
    ) -> VestryResult<Option<ChurchMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE church_id = $church_id AND user_id = $user_id",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_membership().map_err(VestryError::from))
            .transpose()
    }

    async fn set_status(
        &self,
        church_id: Uuid,
        id: Uuid,
        status: MembershipStatus,
    ) -> VestryResult<ChurchMembership> {
        let id_str = id.to_string();

        let result = self
            .db
            .query(
                "UPDATE type::record('membership', $id) SET \
                 status = $status, updated_at = time::now() \
                 WHERE church_id = $church_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()))
            .bind(("status", status_to_string(&status)))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn update(
        &self,
        church_id: Uuid,
        id: Uuid,
        input: UpdateMembership,
    ) -> VestryResult<ChurchMembership> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.preferred_keys.is_some() {
            sets.push("preferred_keys = $preferred_keys");
        }
        if input.notification_preferences.is_some() {
            sets.push("notification_preferences = $notification_preferences");
        }
        if input.permissions_override.is_some() {
            sets.push("permissions_override = $permissions_override");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('membership', $id) SET {} \
             WHERE church_id = $church_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()));

        if let Some(keys) = input.preferred_keys {
            builder = builder.bind(("preferred_keys", keys));
        }
        if let Some(prefs) = input.notification_preferences {
            builder = builder.bind(("notification_preferences", prefs));
        }
        if let Some(override_value) = input.permissions_override {
            // `Some(None)` clears the override by writing NONE.
            let strings = override_value.map(|set| perms_to_strings(&set));
            builder = builder.bind(("permissions_override", strings));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<MembershipRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "membership".into(),
            id: id_str,
        })?;

        Ok(row.into_membership(id)?)
    }

    async fn list_active_for_user(&self, user_id: Uuid) -> VestryResult<Vec<ChurchMembership>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE user_id = $user_id AND status = 'Active' \
                 ORDER BY joined_date ASC",
            )
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;

        let memberships = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(memberships)
    }

    async fn list(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<ChurchMembership>> {
        let church_id_str = church_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM membership \
                 WHERE church_id = $church_id GROUP ALL",
            )
            .bind(("church_id", church_id_str.clone()))
            .await
            .map_err(DbError::from)?;
        let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
        let total = count_rows.first().map(|r| r.total).unwrap_or(0);

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM membership \
                 WHERE church_id = $church_id \
                 ORDER BY joined_date ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("church_id", church_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<MembershipRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_membership())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn count_active(&self, church_id: Uuid) -> VestryResult<u64> {
        let mut result = self
            .db
            .query(
                "SELECT count() AS total FROM membership \
                 WHERE church_id = $church_id AND status = 'Active' \
                 GROUP ALL",
            )
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}
