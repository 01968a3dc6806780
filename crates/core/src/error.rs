//! Domain error taxonomy.
//!
//! One typed error currency for the whole request path. Handlers match on the
//! variant, never on message text; the HTTP layer owns the status mapping.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// The bearer credential was missing, malformed, or expired.
    #[error("invalid or expired credential")]
    AuthenticationFailed,

    /// No profile row exists for an authenticated subject. The common
    /// integration fault for partially-provisioned accounts.
    #[error("user profile not found; contact your administrator")]
    ProfileNotFound,

    /// Profile exists but is marked inactive.
    #[error("your account has been disabled; contact your administrator")]
    AccountDisabled,

    /// Profile references no tenant (and is not a platform profile).
    #[error("your account is not associated with any store")]
    TenantMissing,

    /// Tenant lifecycle forbids access.
    #[error("your organization account has been suspended; contact support")]
    TenantSuspended,

    #[error("your subscription has been cancelled; renew to continue")]
    TenantCancelled,

    /// Subscription end date is in the past, evaluated at read time.
    #[error("your subscription has expired; renew to continue")]
    SubscriptionExpired,

    /// Role gate rejected the action. Carries the role set that would pass.
    #[error("insufficient permissions for this action")]
    InsufficientRole { required: Vec<&'static str> },

    /// Input failed validation; `field` names the offending field.
    #[error("{field}: {message}")]
    ValidationFailed { field: &'static str, message: String },

    /// Cross-tenant access and true absence, deliberately indistinguishable.
    #[error("not found")]
    NotFoundOrForbidden,

    /// The targeted sale is already in the terminal `voided` state.
    #[error("this sale has already been voided")]
    AlreadyVoided,

    /// A scoped query was attempted with no tenant context. Defensive; must
    /// never be reachable when the middleware pipeline is wired correctly.
    #[error("tenant context missing")]
    TenantContextMissing,

    /// The transactional store refused the atomic call (e.g. a stock race).
    /// Surfaced to the caller, never auto-retried.
    #[error("the store rejected the operation: {reason}")]
    DelegateRejected { reason: String },

    /// Infrastructure failure talking to a collaborator. The sanitized message
    /// goes to the client; full context is logged server-side.
    #[error("a backend service is unavailable")]
    StoreUnavailable,
}

impl DomainError {
    pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
        Self::ValidationFailed {
            field,
            message: message.into(),
        }
    }

    pub fn delegate_rejected(reason: impl Into<String>) -> Self {
        Self::DelegateRejected {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_carries_field() {
        let err = DomainError::validation("items", "must not be empty");
        match err {
            DomainError::ValidationFailed { field, .. } => assert_eq!(field, "items"),
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
