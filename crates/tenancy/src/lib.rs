//! `tillpoint-tenancy` — tenant/profile model, request context resolution,
//! and the tenant-scoping query guard.
//!
//! The resolver is the single chokepoint for account and tenant lifecycle
//! enforcement; every tenant-scoped route runs through it.

pub mod context;
pub mod resolver;
pub mod scope;
pub mod tenant;

pub use context::SecurityContext;
pub use resolver::{ProfileDirectory, resolve_context};
pub use scope::{TenantScope, stamp_tenant};
pub use tenant::{Profile, SubscriptionTier, Tenant, TenantStatus};
