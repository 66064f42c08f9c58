//! Tenancy-layer errors.

use std::fmt;

use thiserror::Error;
use vestry_core::error::VestryError;

/// The phase of the legacy migration that was executing when a
/// failure aborted the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStep {
    /// Counting churches and legacy users, deciding whether to run.
    Preflight,
    /// Acquiring the advisory migration lock.
    Lock,
    /// Creating the default church.
    CreateChurch,
    /// Per-user role creation, membership creation, assignment.
    MigrateUsers,
    /// Stamping `church_id` onto the legacy content collections.
    BackfillCollections,
    /// Re-reading migrated state for the validation report.
    Validate,
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MigrationStep::Preflight => "preflight",
            MigrationStep::Lock => "lock",
            MigrationStep::CreateChurch => "create-church",
            MigrationStep::MigrateUsers => "migrate-users",
            MigrationStep::BackfillCollections => "backfill-collections",
            MigrationStep::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// A legacy-migration failure, tagged with the step that was running
/// so the operator knows how far the run got before aborting.
#[derive(Debug, Error)]
#[error("Legacy migration failed at step '{step}': {source}")]
pub struct MigrationError {
    pub step: MigrationStep,
    #[source]
    pub source: VestryError,
}

impl MigrationError {
    pub fn at(step: MigrationStep, source: VestryError) -> Self {
        Self { step, source }
    }
}
