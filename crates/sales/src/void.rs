//! Void protocol preconditions.

use tillpoint_auth::Role;
use tillpoint_core::{DomainError, DomainResult};

/// Roles that may void a sale.
pub const VOID_ROLES: &[Role] = &[Role::PlatformAdmin, Role::TenantAdmin, Role::TenantManager];

/// Minimum length of a void reason after trimming.
pub const MIN_VOID_REASON_LEN: usize = 10;

/// Validate and normalize the mandatory void reason.
pub fn validate_void_reason(reason: &str) -> DomainResult<String> {
    let trimmed = reason.trim();
    if trimmed.len() < MIN_VOID_REASON_LEN {
        return Err(DomainError::validation(
            "reason",
            format!("void reason must be at least {MIN_VOID_REASON_LEN} characters"),
        ));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_reason_is_rejected() {
        assert!(validate_void_reason("typo").is_err());
        assert!(validate_void_reason("  wrong   ").is_err());
    }

    #[test]
    fn reason_is_trimmed() {
        let reason = validate_void_reason("  customer changed their mind  ").unwrap();
        assert_eq!(reason, "customer changed their mind");
    }

    #[test]
    fn cashier_is_not_a_void_role() {
        assert!(!tillpoint_auth::allowed(Role::Cashier, VOID_ROLES));
        assert!(!tillpoint_auth::allowed(Role::InventoryManager, VOID_ROLES));
        assert!(tillpoint_auth::allowed(Role::TenantManager, VOID_ROLES));
    }
}
