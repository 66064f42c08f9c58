//! Database-specific error types and conversions.

use vestry_core::error::VestryError;

/// Database-layer error type.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("SurrealDB error: {0}")]
    Surreal(#[from] surrealdb::Error),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Record not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },
}

impl From<DbError> for VestryError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => VestryError::NotFound { entity, id },
            other => VestryError::Database(other.to_string()),
        }
    }
}

/// Whether a SurrealDB error message reports a unique-index or
/// record-id collision. Repositories map these to the typed duplicate
/// errors so that a concurrent writer losing the race can tell
/// "someone else already created it" apart from a real failure.
pub(crate) fn is_unique_violation(message: &str) -> bool {
    message.contains("already contains") || message.contains("already exists")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_violation_matches_index_and_record_collisions() {
        assert!(is_unique_violation(
            "Database index `idx_church_slug` already contains 'grace', \
             with record `church:x`"
        ));
        assert!(is_unique_violation(
            "Database record `op_lock:legacy_migration` already exists"
        ));
        assert!(!is_unique_violation("connection refused"));
    }

    #[test]
    fn not_found_maps_to_core_not_found() {
        let err = DbError::NotFound {
            entity: "church".into(),
            id: "abc".into(),
        };
        assert!(matches!(
            VestryError::from(err),
            VestryError::NotFound { .. }
        ));
    }
}
