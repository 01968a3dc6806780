//! Tenant-scoping query guard.
//!
//! Every store read/write takes a `TenantScope`. Non-platform actors always
//! get `Tenant(id)`; the platform role gets `All`. A context with neither a
//! tenant nor the platform flag aborts with `TenantContextMissing` instead of
//! silently returning all rows.

use tillpoint_core::{DomainError, DomainResult, TenantId};

use crate::context::SecurityContext;

/// The tenant constraint applied to a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TenantScope {
    /// Platform actors observe all tenants.
    All,
    Tenant(TenantId),
}

impl TenantScope {
    pub fn for_context(ctx: &SecurityContext) -> DomainResult<Self> {
        if ctx.is_super_admin() {
            return Ok(TenantScope::All);
        }
        match ctx.tenant_id() {
            Some(id) => Ok(TenantScope::Tenant(id)),
            None => Err(DomainError::TenantContextMissing),
        }
    }

    /// Does a row owned by `tenant_id` fall inside this scope?
    pub fn covers(&self, tenant_id: TenantId) -> bool {
        match self {
            TenantScope::All => true,
            TenantScope::Tenant(own) => *own == tenant_id,
        }
    }

    /// The equality constraint to append to a query, if any.
    pub fn filter(&self) -> Option<TenantId> {
        match self {
            TenantScope::All => None,
            TenantScope::Tenant(id) => Some(*id),
        }
    }
}

/// Decide the `tenant_id` stamped onto an insert payload.
///
/// Regular actors always write into their own tenant; an explicit tenant id is
/// honored only for platform actors.
pub fn stamp_tenant(
    ctx: &SecurityContext,
    explicit: Option<TenantId>,
) -> DomainResult<TenantId> {
    if ctx.is_super_admin() {
        if let Some(id) = explicit {
            return Ok(id);
        }
    }
    ctx.tenant_id().ok_or(DomainError::TenantContextMissing)
}
