//! Tenancy configuration.

use vestry_core::models::church::SubscriptionTier;

/// Configuration for the tenancy services.
///
/// Names the per-church built-ins the bootstrap hooks seed and the
/// fallbacks the legacy migration uses.
#[derive(Debug, Clone)]
pub struct TenancyConfig {
    /// Display name of the built-in administrator role.
    pub admin_role_name: String,
    /// Slug of the built-in administrator role.
    pub admin_role_slug: String,
    /// Display name of the built-in leader skill.
    pub leader_skill_name: String,
    /// Slug of the built-in leader skill.
    pub leader_skill_slug: String,
    /// Church name of last resort for the legacy migration.
    pub default_church_name: String,
    /// Tier assigned to newly created churches.
    pub default_tier: SubscriptionTier,
}

impl Default for TenancyConfig {
    fn default() -> Self {
        Self {
            admin_role_name: "Administrator".into(),
            admin_role_slug: "admin".into(),
            leader_skill_name: "Leader".into(),
            leader_skill_slug: "leader".into(),
            default_church_name: "My Church".into(),
            default_tier: SubscriptionTier::Free,
        }
    }
}
