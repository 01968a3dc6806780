//! `tillpoint-core` — shared domain foundation.
//!
//! Strongly-typed identifiers, money representation, and the error taxonomy
//! used by every other crate. No I/O, no framework types.

pub mod error;
pub mod id;
pub mod money;

pub use error::{DomainError, DomainResult};
pub use id::{AuditId, BranchId, CustomerId, ProductId, ReturnId, SaleId, TenantId, UserId};
pub use money::{Cents, RateBps};
