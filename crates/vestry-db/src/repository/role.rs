//! SurrealDB implementation of [`RoleRepository`].

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::role::{CreateRole, Role, UpdateRole};
use vestry_core::repository::{PaginatedResult, Pagination, RoleRepository};

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::{parse_perms, parse_uuid, perms_to_strings};

/// DB-side row struct for queries where the UUID is already known.
#[derive(Debug, SurrealValue)]
struct RoleRow {
    church_id: String,
    name: String,
    slug: String,
    permissions: Vec<String>,
    is_builtin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRow {
    fn into_role(self, id: Uuid) -> Result<Role, DbError> {
        Ok(Role {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            name: self.name,
            slug: self.slug,
            permissions: parse_perms(self.permissions)?,
            is_builtin: self.is_builtin,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// DB-side row struct that includes the record ID via `meta::id(id)`.
#[derive(Debug, SurrealValue)]
struct RoleRowWithId {
    record_id: String,
    church_id: String,
    name: String,
    slug: String,
    permissions: Vec<String>,
    is_builtin: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl RoleRowWithId {
    fn try_into_role(self) -> Result<Role, DbError> {
        let id = parse_uuid("record", &self.record_id)?;
        Ok(Role {
            id,
            church_id: parse_uuid("church", &self.church_id)?,
            name: self.name,
            slug: self.slug,
            permissions: parse_perms(self.permissions)?,
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

/// SurrealDB implementation of the Role repository.
#[derive(Clone)]
pub struct SurrealRoleRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealRoleRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> RoleRepository for SurrealRoleRepository<C> {
    async fn create(&self, input: CreateRole) -> VestryResult<Role> {
        let id = Uuid::new_v4();
        let id_str = id.to_string();
        let slug = input.slug.clone();

        let result = self
            .db
            .query(
                "CREATE type::record('role', $id) SET \
                 church_id = $church_id, \
                 name = $name, slug = $slug, \
                 permissions = $permissions, \
                 is_builtin = $is_builtin",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", input.church_id.to_string()))
            .bind(("name", input.name))
            .bind(("slug", input.slug))
            .bind(("permissions", perms_to_strings(&input.permissions)))
            .bind(("is_builtin", input.is_builtin))
            .await
            .map_err(DbError::from)?;

        let mut result = match result.check() {
            Ok(r) => r,
            Err(e) if is_unique_violation(&e.to_string()) => {
                return Err(VestryError::DuplicateSlug {
                    entity: "role".into(),
                    slug,
                });
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        };

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn get_by_id(&self, church_id: Uuid, id: Uuid) -> VestryResult<Role> {
        let id_str = id.to_string();

        let mut result = self
            .db
            .query(
                "SELECT * FROM type::record('role', $id) \
                 WHERE church_id = $church_id",
            )
            .bind(("id", id_str.clone()))
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn find_by_slug(&self, church_id: Uuid, slug: &str) -> VestryResult<Option<Role>> {
        let slug_owned = slug.to_string();

        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE church_id = $church_id AND slug = $slug",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("slug", slug_owned))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;
        rows.into_iter()
            .next()
            .map(|row| row.try_into_role().map_err(VestryError::from))
            .transpose()
    }

    async fn update(&self, church_id: Uuid, id: Uuid, input: UpdateRole) -> VestryResult<Role> {
        let id_str = id.to_string();

        // Slug writes never reach this layer; the registry rejects
        // them with ImmutableSlug before calling update.
        let mut sets = Vec::new();
        if input.name.is_some() {
            sets.push("name = $name");
        }
        if input.permissions.is_some() {
            sets.push("permissions = $permissions");
        }
        sets.push("updated_at = time::now()");

        let query = format!(
            "UPDATE type::record('role', $id) SET {} \
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
        if let Some(permissions) = input.permissions {
            builder = builder.bind(("permissions", perms_to_strings(&permissions)));
        }

        let result = builder.await.map_err(DbError::from)?;
        let mut result = result
            .check()
            .map_err(|e| DbError::Migration(e.to_string()))?;

        let rows: Vec<RoleRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "role".into(),
            id: id_str,
        })?;

        Ok(row.into_role(id)?)
    }

    async fn delete(&self, church_id: Uuid, id: Uuid) -> VestryResult<()> {
        let id_str = id.to_string();

        // Remove assignment rows first, then the role record.
        self.db
            .query(
                "DELETE user_role WHERE church_id = $church_id \
                 AND role_id = $id; \
                 DELETE type::record('role', $id) \
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
    ) -> VestryResult<PaginatedResult<Role>> {
        let church_id_str = church_id.to_string();

        let mut count_result = self
            .db
            .query(
                "SELECT count() AS total FROM role \
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
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE church_id = $church_id \
                 ORDER BY created_at ASC \
                 LIMIT $limit START $offset",
            )
            .bind(("church_id", church_id_str))
            .bind(("limit", pagination.limit))
            .bind(("offset", pagination.offset))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let items = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(PaginatedResult {
            items,
            total,
            offset: pagination.offset,
            limit: pagination.limit,
        })
    }

    async fn list_all(&self, church_id: Uuid) -> VestryResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE church_id = $church_id \
                 ORDER BY created_at ASC",
            )
            .bind(("church_id", church_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| row.try_into_role())
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }
}
