//! Request-scoped security context.

use tillpoint_auth::Role;
use tillpoint_core::{BranchId, RateBps, TenantId, UserId};

use crate::tenant::{Profile, SubscriptionTier, Tenant};

/// Everything downstream code may know about the acting subject.
///
/// Constructed exactly once per request by the resolver, immutable afterwards,
/// passed by reference, and discarded at response time. Never persisted and
/// never shared across requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SecurityContext {
    user_id: UserId,
    email: String,
    full_name: String,
    role: Role,
    tenant_id: Option<TenantId>,
    tenant_name: String,
    tier: SubscriptionTier,
    tax_rate_bps: RateBps,
    branch_id: Option<BranchId>,
    is_super_admin: bool,
}

impl SecurityContext {
    /// Build a context from a resolved profile + tenant pair.
    ///
    /// `is_super_admin` is derived here, once: platform role or membership in
    /// the platform tenant.
    pub fn from_profile(profile: &Profile, tenant: Option<&Tenant>) -> Self {
        let is_super_admin =
            profile.role.is_platform() || tenant.map(|t| t.is_platform).unwrap_or(false);

        Self {
            user_id: profile.id,
            email: profile.email.clone(),
            full_name: profile.full_name.clone(),
            role: profile.role,
            tenant_id: profile.tenant_id,
            tenant_name: tenant.map(|t| t.name.clone()).unwrap_or_default(),
            tier: tenant
                .map(|t| t.tier)
                .unwrap_or(SubscriptionTier::Enterprise),
            tax_rate_bps: tenant.map(|t| t.tax_rate_bps).unwrap_or(0),
            branch_id: profile.branch_id,
            is_super_admin,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn tenant_name(&self) -> &str {
        &self.tenant_name
    }

    pub fn tier(&self) -> SubscriptionTier {
        self.tier
    }

    pub fn tax_rate_bps(&self) -> RateBps {
        self.tax_rate_bps
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    /// Whether this actor observes all tenants (platform role/tenant).
    pub fn is_super_admin(&self) -> bool {
        self.is_super_admin
    }
}
