//! Closed role enumeration and route-level gate predicate.
//!
//! Role strings are normalized exactly once at the boundary (trim + case-fold,
//! legacy aliases folded in); everything downstream compares enum variants.

use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The fixed role set, ordered from most to least privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Distinguished platform role; bypasses tenant scoping.
    PlatformAdmin,
    TenantAdmin,
    TenantManager,
    InventoryManager,
    Cashier,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl Role {
    /// Privilege rank; higher outranks lower. Used by the provisioning
    /// hierarchy and for diagnostics, never for route gates directly.
    pub fn rank(self) -> u8 {
        match self {
            Role::PlatformAdmin => 5,
            Role::TenantAdmin => 4,
            Role::TenantManager => 3,
            Role::InventoryManager => 2,
            Role::Cashier => 1,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::PlatformAdmin => "PLATFORM_ADMIN",
            Role::TenantAdmin => "TENANT_ADMIN",
            Role::TenantManager => "TENANT_MANAGER",
            Role::InventoryManager => "INVENTORY_MANAGER",
            Role::Cashier => "CASHIER",
        }
    }

    pub fn is_platform(self) -> bool {
        matches!(self, Role::PlatformAdmin)
    }
}

impl FromStr for Role {
    type Err = RoleParseError;

    /// The single normalization point: trims, case-folds, and accepts the
    /// legacy aliases still present in older profile rows.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLATFORM_ADMIN" | "SUPER_ADMIN" => Ok(Role::PlatformAdmin),
            "TENANT_ADMIN" | "VENDOR_ADMIN" => Ok(Role::TenantAdmin),
            "TENANT_MANAGER" | "VENDOR_MANAGER" => Ok(Role::TenantManager),
            "INVENTORY_MANAGER" => Ok(Role::InventoryManager),
            "CASHIER" => Ok(Role::Cashier),
            _ => Err(RoleParseError(s.trim().to_string())),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route-level gate: may `role` perform an action restricted to `required`?
///
/// Pure predicate: no state, no I/O. An empty `required` set denies everyone;
/// gates must name their roles explicitly.
pub fn allowed(role: Role, required: &[Role]) -> bool {
    required.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_legacy_aliases_and_case() {
        assert_eq!("SUPER_ADMIN".parse::<Role>().unwrap(), Role::PlatformAdmin);
        assert_eq!("vendor_admin".parse::<Role>().unwrap(), Role::TenantAdmin);
        assert_eq!(
            "  Vendor_Manager ".parse::<Role>().unwrap(),
            Role::TenantManager
        );
        assert_eq!("cashier".parse::<Role>().unwrap(), Role::Cashier);
    }

    #[test]
    fn rejects_unknown_role_strings() {
        assert!("intern".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
    }

    #[test]
    fn gate_requires_exact_membership() {
        let managers = [Role::PlatformAdmin, Role::TenantAdmin, Role::TenantManager];
        assert!(allowed(Role::TenantManager, &managers));
        assert!(!allowed(Role::Cashier, &managers));
        assert!(!allowed(Role::InventoryManager, &managers));
    }

    #[test]
    fn empty_required_set_denies_all() {
        assert!(!allowed(Role::PlatformAdmin, &[]));
    }

    #[test]
    fn rank_is_strictly_ordered() {
        let roles = [
            Role::Cashier,
            Role::InventoryManager,
            Role::TenantManager,
            Role::TenantAdmin,
            Role::PlatformAdmin,
        ];
        for pair in roles.windows(2) {
            assert!(pair[0].rank() < pair[1].rank());
        }
    }
}
