//! SurrealDB repository implementations.

mod assignment;
mod church;
mod legacy;
mod membership;
mod role;
mod skill;

pub use assignment::SurrealAssignmentRepository;
pub use church::SurrealChurchRepository;
pub use legacy::SurrealLegacyRepository;
pub use membership::SurrealMembershipRepository;
pub use role::SurrealRoleRepository;
pub use skill::SurrealSkillRepository;

pub(crate) mod convert {
    //! Shared row-to-model conversion helpers.

    use std::collections::BTreeSet;

    use uuid::Uuid;
    use vestry_core::models::permission::Permission;

    use crate::error::DbError;

    pub(crate) fn parse_uuid(field: &str, value: &str) -> Result<Uuid, DbError> {
        Uuid::parse_str(value)
            .map_err(|e| DbError::Migration(format!("invalid {field} UUID: {e}")))
    }

    pub(crate) fn perms_to_strings(perms: &BTreeSet<Permission>) -> Vec<String> {
        perms.iter().map(|p| p.as_str().to_string()).collect()
    }

    pub(crate) fn parse_perms(values: Vec<String>) -> Result<BTreeSet<Permission>, DbError> {
        values
            .iter()
            .map(|s| {
                Permission::parse(s)
                    .map_err(|_| DbError::Migration(format!("unknown permission: {s}")))
            })
            .collect()
    }
}
