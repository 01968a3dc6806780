//! Tenant and profile records as the store presents them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tillpoint_auth::Role;
use tillpoint_core::{BranchId, RateBps, TenantId, UserId};

/// Tenant lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenantStatus {
    Trial,
    Active,
    Suspended,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Trial,
    Basic,
    Pro,
    Enterprise,
}

/// An isolated business account; the unit of data partitioning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub status: TenantStatus,
    pub tier: SubscriptionTier,

    /// Subscription end; evaluated against the clock at resolution time.
    pub subscription_ends_at: Option<DateTime<Utc>>,

    /// The distinguished platform tenant whose members bypass scoping.
    pub is_platform: bool,

    /// Tax rate in basis points for tax-inclusive totals (1300 = 13%).
    ///
    /// TODO: confirm with stakeholders whether tenants may edit this or it is
    /// set once at onboarding; the coordinator already reads it per tenant.
    pub tax_rate_bps: RateBps,

    /// Soft-delete marker; tenants are never hard-deleted while referencing
    /// records exist.
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A user profile. Belongs to exactly one tenant; `tenant_id` is `None` only
/// for platform-tenant profiles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: UserId,
    pub tenant_id: Option<TenantId>,
    pub role: Role,
    pub full_name: String,
    pub email: String,
    pub active: bool,
    pub branch_id: Option<BranchId>,
}
