//! Schema definitions and migration runner for SurrealDB.
//!
//! Tenant-model tables use SCHEMAFULL mode for data integrity. UUIDs
//! are stored as strings. Enums are stored as strings with ASSERT
//! constraints. The legacy collections that predate the tenant model
//! are SCHEMALESS — the legacy migration backfills `church_id` onto
//! whatever shape those records have.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

// -----------------------------------------------------------------------
// Migration tracking
// -----------------------------------------------------------------------

const MIGRATION_TABLE_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS name ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS idx_migration_version ON TABLE _migration \
    COLUMNS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct MigrationRecord {
    version: u32,
    #[allow(dead_code)]
    name: String,
}

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

static MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "initial_schema",
    sql: SCHEMA_V1,
}];

// -----------------------------------------------------------------------
// Schema v1 — initial table definitions
// -----------------------------------------------------------------------

const SCHEMA_V1: &str = "\
-- =======================================================================
-- Churches (tenant root, global scope)
-- =======================================================================
DEFINE TABLE church SCHEMAFULL;
DEFINE FIELD name ON TABLE church TYPE string;
DEFINE FIELD slug ON TABLE church TYPE string;
DEFINE FIELD owner_user_id ON TABLE church TYPE string;
DEFINE FIELD tier ON TABLE church TYPE string \
    ASSERT $value IN ['Free', 'Standard', 'Unlimited'];
DEFINE FIELD settings ON TABLE church TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD is_active ON TABLE church TYPE bool DEFAULT true;
DEFINE FIELD created_at ON TABLE church TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE church TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_church_slug ON TABLE church COLUMNS slug UNIQUE;

-- =======================================================================
-- Memberships (tenant scope, one per (church, user))
-- =======================================================================
DEFINE TABLE membership SCHEMAFULL;
DEFINE FIELD church_id ON TABLE membership TYPE string;
DEFINE FIELD user_id ON TABLE membership TYPE string;
DEFINE FIELD status ON TABLE membership TYPE string \
    ASSERT $value IN ['Invited', 'Active', 'Inactive'];
DEFINE FIELD permissions_override ON TABLE membership \
    TYPE option<array<string>>;
DEFINE FIELD preferred_keys ON TABLE membership TYPE array<string> \
    DEFAULT [];
DEFINE FIELD notification_preferences ON TABLE membership \
    TYPE object FLEXIBLE DEFAULT {};
DEFINE FIELD joined_date ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD created_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE membership TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_membership_church_user ON TABLE membership \
    COLUMNS church_id, user_id UNIQUE;
DEFINE INDEX idx_membership_user ON TABLE membership \
    COLUMNS user_id, status;

-- =======================================================================
-- Roles (tenant scope)
-- =======================================================================
DEFINE TABLE role SCHEMAFULL;
DEFINE FIELD church_id ON TABLE role TYPE string;
DEFINE FIELD name ON TABLE role TYPE string;
DEFINE FIELD slug ON TABLE role TYPE string;
DEFINE FIELD permissions ON TABLE role TYPE array<string> DEFAULT [];
DEFINE FIELD is_builtin ON TABLE role TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_role_church_slug ON TABLE role \
    COLUMNS church_id, slug UNIQUE;

-- =======================================================================
-- Skills (tenant scope)
-- =======================================================================
DEFINE TABLE skill SCHEMAFULL;
DEFINE FIELD church_id ON TABLE skill TYPE string;
DEFINE FIELD name ON TABLE skill TYPE string;
DEFINE FIELD slug ON TABLE skill TYPE string;
DEFINE FIELD is_builtin ON TABLE skill TYPE bool DEFAULT false;
DEFINE FIELD created_at ON TABLE skill TYPE datetime \
    DEFAULT time::now();
DEFINE FIELD updated_at ON TABLE skill TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_skill_church_slug ON TABLE skill \
    COLUMNS church_id, slug UNIQUE;

-- =======================================================================
-- Role / skill assignments (tenant scope, join records)
-- =======================================================================
DEFINE TABLE user_role SCHEMAFULL;
DEFINE FIELD church_id ON TABLE user_role TYPE string;
DEFINE FIELD user_id ON TABLE user_role TYPE string;
DEFINE FIELD role_id ON TABLE user_role TYPE string;
DEFINE FIELD created_at ON TABLE user_role TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_role_unique ON TABLE user_role \
    COLUMNS church_id, user_id, role_id UNIQUE;
DEFINE INDEX idx_user_role_role ON TABLE user_role \
    COLUMNS church_id, role_id;

DEFINE TABLE user_skill SCHEMAFULL;
DEFINE FIELD church_id ON TABLE user_skill TYPE string;
DEFINE FIELD user_id ON TABLE user_skill TYPE string;
DEFINE FIELD skill_id ON TABLE user_skill TYPE string;
DEFINE FIELD created_at ON TABLE user_skill TYPE datetime \
    DEFAULT time::now();
DEFINE INDEX idx_user_skill_unique ON TABLE user_skill \
    COLUMNS church_id, user_id, skill_id UNIQUE;
DEFINE INDEX idx_user_skill_skill ON TABLE user_skill \
    COLUMNS church_id, skill_id;

-- =======================================================================
-- Legacy collections (pre-tenant data, backfilled by the migration)
-- =======================================================================
DEFINE TABLE legacy_user SCHEMALESS;
DEFINE TABLE song SCHEMALESS;
DEFINE TABLE service SCHEMALESS;
DEFINE TABLE category SCHEMALESS;
DEFINE TABLE label SCHEMALESS;

-- =======================================================================
-- Advisory operation locks
-- =======================================================================
DEFINE TABLE op_lock SCHEMALESS;
";

// -----------------------------------------------------------------------
// Public API
// -----------------------------------------------------------------------

/// Run all pending migrations against the given SurrealDB client.
///
/// Creates a `_migration` tracking table on first run, then applies
/// each migration whose version exceeds the current maximum.
/// All DEFINE statements are idempotent so re-running is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    // Ensure migration tracking table exists (idempotent).
    db.query(MIGRATION_TABLE_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    // Determine current schema version.
    let mut result = db
        .query("SELECT * FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let records: Vec<MigrationRecord> = result.take(0)?;
    let current_version = records.first().map(|m| m.version).unwrap_or(0);

    for migration in MIGRATIONS {
        if migration.version > current_version {
            info!(
                version = migration.version,
                name = migration.name,
                "Applying migration"
            );
            db.query(migration.sql).await?.check().map_err(|e| {
                DbError::Migration(format!(
                    "Migration v{} '{}' failed: {}",
                    migration.version, migration.name, e,
                ))
            })?;

            // Record the applied migration.
            db.query(
                "CREATE _migration SET version = $version, \
                 name = $name",
            )
            .bind(("version", migration.version))
            .bind(("name", migration.name))
            .await?
            .check()
            .map_err(|e| {
                DbError::Migration(format!(
                    "Failed to record migration v{}: {}",
                    migration.version, e,
                ))
            })?;

            info!(
                version = migration.version,
                "Migration applied successfully"
            );
        }
    }

    Ok(())
}

/// Returns the raw schema DDL for version 1.
///
/// Exposed for testing with in-memory SurrealDB instances that
/// bypass the migration runner.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_v1_is_nonempty() {
        assert!(!SCHEMA_V1.is_empty());
    }

    #[test]
    fn migrations_are_ordered() {
        for window in MIGRATIONS.windows(2) {
            assert!(
                window[0].version < window[1].version,
                "Migrations must be in ascending version order"
            );
        }
    }

    #[test]
    fn schema_defines_tenant_uniqueness_indexes() {
        for index in [
            "idx_church_slug",
            "idx_membership_church_user",
            "idx_role_church_slug",
            "idx_skill_church_slug",
            "idx_user_role_unique",
            "idx_user_skill_unique",
        ] {
            assert!(SCHEMA_V1.contains(index), "missing index {index}");
        }
    }
}
