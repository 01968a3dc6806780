//! Account-provisioning hierarchy.
//!
//! Independent of the route-level gate: a role may only create accounts with
//! roles strictly below its own. Re-evaluated on every user-creation call.

use crate::Role;

/// Declarative table: the roles each role may provision.
///
/// Kept explicit rather than derived from `rank()` so a future exception
/// (e.g. letting `TenantAdmin` create peer admins) is a one-line change.
const PROVISION_TABLE: &[(Role, &[Role])] = &[
    (
        Role::PlatformAdmin,
        &[
            Role::TenantAdmin,
            Role::TenantManager,
            Role::InventoryManager,
            Role::Cashier,
        ],
    ),
    (
        Role::TenantAdmin,
        &[Role::TenantManager, Role::InventoryManager, Role::Cashier],
    ),
    (Role::TenantManager, &[Role::InventoryManager, Role::Cashier]),
    (Role::InventoryManager, &[]),
    (Role::Cashier, &[]),
];

/// May `creator` provision an account with role `target`?
pub fn can_provision(creator: Role, target: Role) -> bool {
    PROVISION_TABLE
        .iter()
        .find(|(role, _)| *role == creator)
        .map(|(_, allowed)| allowed.contains(&target))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_is_strictly_below() {
        assert!(can_provision(Role::TenantAdmin, Role::Cashier));
        assert!(can_provision(Role::TenantManager, Role::Cashier));
        assert!(!can_provision(Role::TenantManager, Role::TenantManager));
        assert!(!can_provision(Role::TenantManager, Role::TenantAdmin));
    }

    #[test]
    fn nobody_provisions_platform_admins() {
        for creator in [
            Role::PlatformAdmin,
            Role::TenantAdmin,
            Role::TenantManager,
            Role::InventoryManager,
            Role::Cashier,
        ] {
            assert!(!can_provision(creator, Role::PlatformAdmin));
        }
    }

    #[test]
    fn leaf_roles_provision_nothing() {
        for target in [
            Role::TenantAdmin,
            Role::TenantManager,
            Role::InventoryManager,
            Role::Cashier,
        ] {
            assert!(!can_provision(Role::Cashier, target));
            assert!(!can_provision(Role::InventoryManager, target));
        }
    }

    #[test]
    fn table_matches_rank_order() {
        // The strictly-below rule and the rank order must agree.
        let all = [
            Role::PlatformAdmin,
            Role::TenantAdmin,
            Role::TenantManager,
            Role::InventoryManager,
            Role::Cashier,
        ];
        for creator in all {
            for target in all {
                if can_provision(creator, target) {
                    assert!(target.rank() < creator.rank());
                }
            }
        }
    }
}
