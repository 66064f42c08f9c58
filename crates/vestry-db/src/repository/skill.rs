//! SurrealDB implementation of [`SkillRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::skill::{CreateSkill, Skill, UpdateSkill};
use vestry_core::repository::{PaginatedResult, Pagination, SkillRepository};

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::parse_uuid;

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct SkillRow {
    church_id: String,
    name: String,
    slug: String,
    is_builtin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SkillRow {
    fn into_skill(self, id: Uuid) -> Result<Skill, DbError> {
        Ok(Skill {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            name: self.name,
            slug: self.slug,
            is_builtin: self.is_builtin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct SkillRowWithId {
    record_id: String,
    church_id: String,
    name: String,
    slug: String,
    is_builtin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SkillRowWithId {
    fn try_into_skill(self) -> Result<Skill, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Skill {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            name: self.name,
            slug: self.slug,
            is_builtin: self.is_builtin,
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

/// SurrealDB implementation of the Skill repository.
#[derive(Clone)]
pub struct SurrealSkillRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSkillRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SkillRepository for SurrealSkillRepository<C> {
    async fn create(&self, input: CreateSkill) -> VestryResult<Skill> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let slug = input.slug.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('skill', $id) SET \
                 church_id = $church_id, \
                 name = $name, slug = $slug, \
                 is_builtin = $is_builtin",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", input.church_id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("is_builtin", input.is_builtin))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e.to_string()) => {
                return Err(VestryError::DuplicateSlug {
                    entity: "skill".into(),
                    slug,
                });
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        };

        let rows: Vec<SkillRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "skill".into(),
            id: id_str,
        })?;

        Ok(row.into_skill(id)?)
    }

    async fn get_by_id(&self, church_id: Uuid, id: Uuid) -> VestryResult<Skill> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('skill', $id) \
                 WHERE church_id = $church_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "skill".into(),
            id: id_str,
        })?;

        Ok(row.into_skill(id)?)
    }

    async fn find_by_slug(&self, church_id: Uuid, slug: &str) -> VestryResult<Option<Skill>> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill \
                 WHERE church_id = $church_id AND slug = $slug",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("slug", slug_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_skill().map_err(VestryError::from))
            .transpose()
    }

    async fn update(&self, church_id: Uuid, id: Uuid, input: UpdateSkill) -> VestryResult<Skill> {
        let id_str = id.to_string();

        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('skill', $id) SET {} \
             WHERE church_id = $church_id",
            sets.join(", ")
        );

        let mut builder = self
            .db
            .query(&query)
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()));

        if let Some(name) = input.name {
            builder = builder.bind(("name", name));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<SkillRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "skill".into(),
            id: id_str,
        })?;

        Ok(row.into_skill(id)?)
    }

    async fn delete(&self, church_id: Uuid, id: Uuid) -> VestryResult<()> {
        let id_str = id.to_string();

        // Remove assignment rows first, then the skill record.
        self.db
            .query(
                "DELETE user_skill WHERE church_id = $church_id \
                 AND skill_id = $id; \
                 DELETE type::record('skill', $id) \
                 WHERE church_id = $church_id;",
            )
            .bind(("id", id_str))
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn list(
        &self,
        church_id: Uuid,
        pagination: Pagination,
    ) -> VestryResult<PaginatedResult<Skill>> {
        let church_id_str = church_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM skill \
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
                "SELECT meta::id(id) AS record_id, * FROM skill \
                 WHERE church_id = $church_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("church_id", church_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_skill())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self, church_id: Uuid) -> VestryResult<Vec<Skill>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill \
                 WHERE church_id = $church_id \
                 ORDER BY created_at ASC",
            )
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillRowWithId> = result.take(0).map_err(DbError::from)?;

        let skills = rows
            .into_iter()
            .map(|row| row.try_into_skill())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(skills)
    }
}
