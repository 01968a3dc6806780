//! Tenant context resolution.
//!
//! Runs after credential verification and before any tenant-scoped operation.
//! One combined profile+tenant lookup (no N+1, no window where the two are
//! read inconsistently), then the lifecycle ladder, then an immutable
//! `SecurityContext`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use tillpoint_core::{DomainError, DomainResult, UserId};

use crate::context::SecurityContext;
use crate::tenant::{Profile, Tenant, TenantStatus};

/// Combined profile + owning-tenant lookup.
///
/// `Ok(None)` means no profile row exists for the subject. The tenant is
/// `None` when the profile references no tenant (platform profiles, or the
/// partially-provisioned fault case).
#[async_trait]
pub trait ProfileDirectory: Send + Sync {
    async fn profile_with_tenant(
        &self,
        user_id: UserId,
    ) -> DomainResult<Option<(Profile, Option<Tenant>)>>;
}

/// Resolve the security context for a verified subject.
///
/// Check order is fixed; every failure maps to a distinct 403-class error and
/// none of them reveals internal row identifiers. Subscription expiry is
/// computed against `now` at every call, never cached.
pub async fn resolve_context(
    directory: &dyn ProfileDirectory,
    subject_id: UserId,
    now: DateTime<Utc>,
) -> DomainResult<SecurityContext> {
    let Some((profile, tenant)) = directory.profile_with_tenant(subject_id).await? else {
        tracing::warn!(subject = %subject_id, "no profile row for authenticated subject");
        return Err(DomainError::ProfileNotFound);
    };

    if !profile.active {
        return Err(DomainError::AccountDisabled);
    }

    let tenant = match (&tenant, profile.role.is_platform()) {
        (Some(t), _) => Some(t),
        // Platform profiles may live outside any tenant.
        (None, true) => None,
        (None, false) => return Err(DomainError::TenantMissing),
    };

    if let Some(tenant) = tenant {
        if tenant.deleted_at.is_some() {
            return Err(DomainError::TenantCancelled);
        }
        match tenant.status {
            TenantStatus::Suspended => return Err(DomainError::TenantSuspended),
            TenantStatus::Cancelled => return Err(DomainError::TenantCancelled),
            TenantStatus::Trial | TenantStatus::Active => {}
        }
        if let Some(ends_at) = tenant.subscription_ends_at {
            if ends_at < now {
                return Err(DomainError::SubscriptionExpired);
            }
        }
    }

    Ok(SecurityContext::from_profile(&profile, tenant))
}
