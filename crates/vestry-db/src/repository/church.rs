//! SurrealDB implementation of [`ChurchRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::church::{Church, CreateChurch, SubscriptionTier, UpdateChurch};
use vestry_core::repository::{ChurchRepository, PaginatedResult, Pagination};

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::parse_uuid;

fn parse_tier(s: &str) -> Result<SubscriptionTier, DbError> {
    match s {
        "Free" => Ok(SubscriptionTier::Free),
        "Standard" => Ok(SubscriptionTier::Standard),
        "Unlimited" => Ok(SubscriptionTier::Unlimited),
        other => Err(DbError::Migration(format!("unknown tier: {other}"))),
    }
}

fn tier_to_string(t: &SubscriptionTier) -> &'static str {
    match t {
        SubscriptionTier::Free => "Free",
        SubscriptionTier::Standard => "Standard",
        SubscriptionTier::Unlimited => "Unlimited",
    }
}

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct ChurchRow {
    name: String,
    slug: String,
    owner_user_id: String,
    tier: String,
    settings: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChurchRow {
    fn into_church(self, id: Uuid) -> Result<Church, DbError> {
        Ok(Church {
            id,
            name: self.name,
            slug: self.slug,
            owner_user_id: parse_uuid("owner", &self.owner_user_id)?,
            tier: parse_tier(&self.tier)?,
            settings: self.settings,
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct ChurchRowWithId {
    record_id: String,
    name: String,
    slug: String,
    owner_user_id: String,
    tier: String,
    settings: serde_json::Value,
    is_active: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ChurchRowWithId {
    fn try_into_church(self) -> Result<Church, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Church {
            id,
            name: self.name,
            slug: self.slug,
            owner_user_id: parse_uuid("owner", &self.owner_user_id)?,
            tier: parse_tier(&self.tier)?,
            settings: self.settings,
            is_active: self.is_active,
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

/// SurrealDB implementation of the Church repository.
#[derive(Clone)]
pub struct SurrealChurchRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealChurchRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> ChurchRepository for SurrealChurchRepository<C> {
    async fn create(&self, input: CreateChurch) -> VestryResult<Church> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let slug = input.slug.clone();
        let settings = input
            .settings
            .unwrap_or(serde_json::Value::Object(Default::default()));

        let result = self
            .db
            .query(
                "CREATE type::record('church', $id) SET \
                 name = $name, slug = $slug, \
                 owner_user_id = $owner_user_id, \
                 tier = $tier, settings = $settings, \
                 is_active = true",
            )
            .bind(("id", id_str.clone()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("owner_user_id", input.owner_user_id.to_string()))
            .bind(("tier", tier_to_string(&input.tier)))
            .bind(("settings", settings))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e.to_string()) => {
                return Err(VestryError::DuplicateSlug {
                    entity: "church".into(),
                    slug,
                });
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        };

        let rows: Vec<ChurchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "church".into(),
            id: id_str,
        })?;

        Ok(row.into_church(id)?)
    }

    async fn get_by_id(&self, id: Uuid) -> VestryResult<Church> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query("SELECT * FROM type::record('church', $id)")
            .bind(("id", id_str.clone()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChurchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "church".into(),
            id: id_str,
        })?;

        Ok(row.into_church(id)?)
    }

    async fn get_by_slug(&self, slug: &str) -> VestryResult<Church> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * \
                 FROM church WHERE slug = $slug",
            )
            .bind(("slug", slug_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChurchRowWithId> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "church".into(),
            id: format!("slug={slug}"),
        })?;

        Ok(row.try_into_church()?)
    }

    async fn update(&self, id: Uuid, input: UpdateChurch) -> VestryResult<Church> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.tier.is_some() {
            sets.push("tier = $tier");
        }
        if input.settings.is_some() {
            sets.push("settings = $settings");
        }
        sets.push("updated_at = time::now()");

        let query = format!("UPDATE type::record('church', $id) SET {}", sets.join(", "));

        let mut builder = self.db.query(&query).bind(("id", id_str.clone()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }
        if let Some(tier) = input.tier {
            builder = builder.bind(("tier", tier_to_string(&tier)));
        }
        if let Some(settings) = input.settings {
            builder = builder.bind(("settings", settings));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<ChurchRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "church".into(),
            id: id_str,
        })?;

        Ok(row.into_church(id)?)
    }

    async fn set_active(&self, id: Uuid, active: bool) -> VestryResult<()> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "UPDATE type::record('church', $id) SET \
                 is_active = $active, updated_at = time::now()",
            )
            .bind(("id", id_str.clone()))
            .bind(("active", active))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChurchRow> = result.take(0).map_err(DbError::from)?;
        if rows.is_empty() {
            return Err(DbError::NotFound {
                entity: "church".into(),
                id: id_str,
            }
            .into());
        }

        Ok(())
    }

    async fn count(&self) -> VestryResult<u64> {
        let mut result = self
            .db
            .query("SELECT count() AS total FROM church GROUP ALL")
            .await
            .map_err(DbError::from)?;
        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn list(&self, pagination: Pagination) -> VestryResult<PaginatedResult<Church>> {
        let total = self.count().await?;

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM church \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<ChurchRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_church())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }
}
