//! SurrealDB implementation of [`AssignmentRepository`].
//!
//! Assignments are join records with a unique index per
//! (church, user, role|skill). `assign_*` is find-before-create and
//! treats a lost creation race as "already assigned", so repeated
//! invocation from the bootstrap hooks is safe.

use chrono::{DateTime, Utc};
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use uuid::Uuid;
use vestry_core::error::{VestryError, VestryResult};
use vestry_core::models::assignment::{UserRole, UserSkill};
use vestry_core::models::role::Role;
use vestry_core::models::skill::Skill;
use vestry_core::repository::AssignmentRepository;

use crate::error::{DbError, is_unique_violation};
use crate::repository::convert::{parse_perms, parse_uuid};

/// Row shared by `user_role` and `user_skill` queries; `subject_id` is
/// the role or skill id.
#[derive(Debug, SurrealValue)]
struct AssignmentRow {
    record_id: String,
    church_id: String,
    user_id: String,
    subject_id: String,
    created_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn try_into_user_role(self) -> Result<UserRole, DbError> {
        Ok(UserRole {
            id: parse_uuid("record", &self.record_id)?,
            church_id: parse_uuid("church", &self.church_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            role_id: parse_uuid("role", &self.subject_id)?,
            created_at: self.created_at,
        })
    }

    fn try_into_user_skill(self) -> Result<UserSkill, DbError> {
        Ok(UserSkill {
            id: parse_uuid("record", &self.record_id)?,
            church_id: parse_uuid("church", &self.church_id)?,
            user_id: parse_uuid("user", &self.user_id)?,
            skill_id: parse_uuid("skill", &self.subject_id)?,
            created_at: self.created_at,
        })
    }
}

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

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

/// SurrealDB implementation of the Assignment repository.
#[derive(Clone)]
pub struct SurrealAssignmentRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealAssignmentRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    /// Look up an existing assignment row in `table` where the role or
    /// skill column `column` equals `subject_id`.
    async fn find_assignment(
        &self,
        table: &'static str,
        column: &'static str,
        church_id: Uuid,
        user_id: Uuid,
        subject_id: Uuid,
    ) -> VestryResult<Option<AssignmentRow>> {
        let query = format!(
            "SELECT meta::id(id) AS record_id, church_id, user_id, \
             {column} AS subject_id, created_at FROM {table} \
             WHERE church_id = $church_id AND user_id = $user_id \
             AND {column} = $subject_id"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<AssignmentRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.into_iter().next())
    }

    /// Find-before-create with a unique-index backstop: two concurrent
    /// callers can both miss the lookup; the loser of the create race
    /// re-reads the winner's row.
    async fn create_assignment(
        &self,
        table: &'static str,
        column: &'static str,
        church_id: Uuid,
        user_id: Uuid,
        subject_id: Uuid,
    ) -> VestryResult<AssignmentRow> {
        if let Some(existing) = self
            .find_assignment(table, column, church_id, user_id, subject_id)
            .await?
        {
            return Ok(existing);
        }

        let id = Uuid::new_v4();
        let query = format!(
            "CREATE type::record('{table}', $id) SET \
             church_id = $church_id, user_id = $user_id, \
             {column} = $subject_id"
        );

        let result = self
            .db
            .query(query)
            .bind(("id", id.to_string()))
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        match result.check() {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e.to_string()) => {
                return self
                    .find_assignment(table, column, church_id, user_id, subject_id)
                    .await?
                    .ok_or_else(|| {
                        VestryError::Internal(format!(
                            "{table} row vanished after duplicate-create race"
                        ))
                    });
            }
            Err(e) => return Err(DbError::Migration(e.to_string()).into()),
        }

        self.find_assignment(table, column, church_id, user_id, subject_id)
            .await?
            .ok_or_else(|| {
                DbError::NotFound {
                    entity: table.into(),
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn delete_assignment(
        &self,
        table: &'static str,
        column: &'static str,
        church_id: Uuid,
        user_id: Uuid,
        subject_id: Uuid,
    ) -> VestryResult<()> {
        let query = format!(
            "DELETE {table} WHERE church_id = $church_id \
             AND user_id = $user_id AND {column} = $subject_id"
        );

        self.db
            .query(query)
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        Ok(())
    }

    async fn count_assignments(
        &self,
        table: &'static str,
        column: &'static str,
        church_id: Uuid,
        subject_id: Uuid,
    ) -> VestryResult<u64> {
        let query = format!(
            "SELECT count() AS total FROM {table} \
             WHERE church_id = $church_id AND {column} = $subject_id \
             GROUP ALL"
        );

        let mut result = self
            .db
            .query(query)
            .bind(("church_id", church_id.to_string()))
            .bind(("subject_id", subject_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<CountRow> = result.take(0).map_err(DbError::from)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }
}

impl<C: Connection> AssignmentRepository for SurrealAssignmentRepository<C> {
    async fn assign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> VestryResult<UserRole> {
        let row = self
            .create_assignment("user_role", "role_id", church_id, user_id, role_id)
            .await?;
        Ok(row.try_into_user_role()?)
    }

    async fn unassign_role(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> VestryResult<()> {
        self.delete_assignment("user_role", "role_id", church_id, user_id, role_id)
            .await
    }

    async fn assign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> VestryResult<UserSkill> {
        let row = self
            .create_assignment("user_skill", "skill_id", church_id, user_id, skill_id)
            .await?;
        Ok(row.try_into_user_skill()?)
    }

    async fn unassign_skill(
        &self,
        church_id: Uuid,
        user_id: Uuid,
        skill_id: Uuid,
    ) -> VestryResult<()> {
        self.delete_assignment("user_skill", "skill_id", church_id, user_id, skill_id)
            .await
    }

    async fn roles_for_user(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<Vec<Role>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM role \
                 WHERE church_id = $church_id \
                 AND meta::id(id) IN (\
                     SELECT VALUE role_id FROM user_role \
                     WHERE church_id = $church_id \
                     AND user_id = $user_id\
                 )",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<RoleRowWithId> = result.take(0).map_err(DbError::from)?;

        let roles = rows
            .into_iter()
            .map(|row| {
                Ok(Role {
                    id: parse_uuid("record", &row.record_id)?,
                    church_id: parse_uuid("church", &row.church_id)?,
                    name: row.name,
                    slug: row.slug,
                    permissions: parse_perms(row.permissions)?,
                    is_builtin: row.is_builtin,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(roles)
    }

    async fn skills_for_user(&self, church_id: Uuid, user_id: Uuid) -> VestryResult<Vec<Skill>> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM skill \
                 WHERE church_id = $church_id \
                 AND meta::id(id) IN (\
                     SELECT VALUE skill_id FROM user_skill \
                     WHERE church_id = $church_id \
                     AND user_id = $user_id\
                 )",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("user_id", user_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SkillRowWithId> = result.take(0).map_err(DbError::from)?;

        let skills = rows
            .into_iter()
            .map(|row| {
                Ok(Skill {
                    id: parse_uuid("record", &row.record_id)?,
                    church_id: parse_uuid("church", &row.church_id)?,
                    name: row.name,
                    slug: row.slug,
                    is_builtin: row.is_builtin,
                    created_at: row.created_at,
                    updated_at: row.updated_at,
                })
            })
            .collect::<Result<Vec<_>, DbError>>()?;

        Ok(skills)
    }

    async fn users_with_role(&self, church_id: Uuid, role_id: Uuid) -> VestryResult<Vec<Uuid>> {
        let mut result = self
            .db
            .query(
                "SELECT VALUE user_id FROM user_role \
                 WHERE church_id = $church_id AND role_id = $role_id",
            )
            .bind(("church_id", church_id.to_string()))
            .bind(("role_id", role_id.to_string()))
            .await
            .map_err(DbError::from)?;

        let ids: Vec<String> = result.take(0).map_err(DbError::from)?;
        ids.iter()
            .map(|s| parse_uuid("user", s).map_err(VestryError::from))
            .collect()
    }

    async fn count_role_users(&self, church_id: Uuid, role_id: Uuid) -> VestryResult<u64> {
        self.count_assignments("user_role", "role_id", church_id, role_id)
            .await
    }

    async fn count_skill_users(&self, church_id: Uuid, skill_id: Uuid) -> VestryResult<u64> {
        self.count_assignments("user_skill", "skill_id", church_id, skill_id)
            .await
    }
}
