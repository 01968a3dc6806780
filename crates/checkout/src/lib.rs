//! `tillpoint-checkout` — the transaction coordinator.
//!
//! Orchestrates sale creation, void, and return: local validation and pricing,
//! then exactly one delegation to the store's atomic procedure, then a
//! fire-and-forget audit entry. Holds no shared mutable state; all
//! cross-request exclusion belongs to the store.

pub mod coordinator;

pub use coordinator::{Coordinator, SALE_ROLES};
