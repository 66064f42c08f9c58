//! Vestry server — application entry point.
//!
//! Connects to SurrealDB, applies schema migrations, and dispatches on
//! the first argument:
//!
//! - `migrate` — run the one-shot legacy migration and log the report
//! - `check-migration` — probe whether the legacy migration is needed
//! - no argument — report readiness and exit

use tracing_subscriber::EnvFilter;
use vestry_db::repository::{
    SurrealAssignmentRepository, SurrealChurchRepository, SurrealLegacyRepository,
    SurrealMembershipRepository, SurrealRoleRepository, SurrealSkillRepository,
};
use vestry_db::{DbConfig, DbManager, run_migrations};
use vestry_tenancy::bootstrap::Bootstrap;
use vestry_tenancy::churches::ChurchService;
use vestry_tenancy::config::TenancyConfig;
use vestry_tenancy::migrate::LegacyMigration;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive("vestry=info".parse().unwrap()),
        )
        .json()
        .init();

    tracing::info!("Starting Vestry server...");

    let config = DbConfig::from_env();
    let manager = match DbManager::connect(&config).await {
        Ok(manager) => manager,
        Err(e) => {
            tracing::error!(error = %e, "Failed to connect to SurrealDB");
            std::process::exit(1);
        }
    };

    if let Err(e) = run_migrations(manager.client()).await {
        tracing::error!(error = %e, "Schema migration failed");
        std::process::exit(1);
    }

    let db = manager.client().clone();
    let tenancy = TenancyConfig::default();

    let church_repo = SurrealChurchRepository::new(db.clone());
    let membership_repo = SurrealMembershipRepository::new(db.clone());
    let role_repo = SurrealRoleRepository::new(db.clone());
    let skill_repo = SurrealSkillRepository::new(db.clone());
    let assignment_repo = SurrealAssignmentRepository::new(db.clone());
    let legacy_repo = SurrealLegacyRepository::new(db.clone());

    let bootstrap = Bootstrap::new(
        church_repo.clone(),
        role_repo.clone(),
        skill_repo.clone(),
        assignment_repo.clone(),
        tenancy.clone(),
    );
    let churches = ChurchService::new(church_repo.clone(), bootstrap, tenancy.clone());
    let migration = LegacyMigration::new(
        churches,
        church_repo,
        membership_repo,
        role_repo,
        assignment_repo,
        legacy_repo,
        tenancy,
    );

    match std::env::args().nth(1).as_deref() {
        Some("migrate") => {
            match migration.migrate().await {
                Ok(report) => {
                    tracing::info!(
                        performed = report.performed,
                        church_id = ?report.church_id,
                        church_name = ?report.church_name,
                        users_migrated = report.users_migrated,
                        roles_created = ?report.roles_created,
                        records_backfilled = ?report.records_backfilled,
                        "Legacy migration finished"
                    );
                    for recommendation in &report.cleanup_recommendations {
                        tracing::info!(recommendation = %recommendation, "Cleanup recommendation");
                    }
                }
                Err(e) => {
                    tracing::error!(step = %e.step, error = %e, "Legacy migration failed");
                    std::process::exit(1);
                }
            }
            match migration.validate_migration().await {
                Ok(validation) if validation.is_ok() => {
                    tracing::info!("Migration validation passed");
                }
                Ok(validation) => {
                    for issue in &validation.issues {
                        tracing::warn!(issue = %issue, "Migration validation issue");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "Migration validation failed");
                    std::process::exit(1);
                }
            }
        }
        Some("check-migration") => match migration.is_migration_needed().await {
            Ok(needed) => tracing::info!(needed, "Legacy migration probe"),
            Err(e) => {
                tracing::error!(error = %e, "Legacy migration probe failed");
                std::process::exit(1);
            }
        },
        Some(other) => {
            tracing::error!(command = other, "Unknown command");
            std::process::exit(2);
        }
        None => {
            tracing::info!("Vestry is ready; schema is up to date");
        }
    }
}
