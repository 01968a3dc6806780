//! `tillpoint-store` — transactional data store collaborators.
//!
//! The store is an external system with three atomic procedures (sale, void,
//! return); this crate defines the contract the coordinator relies on and two
//! implementations: Postgres (production) and in-memory (tests / dev mode).
//!
//! The contract the coordinator depends on, and nothing more:
//! - each procedure is all-or-nothing;
//! - `(tenant_id, idempotency_key)` is unique, and a replay of a committed
//!   sale resolves to the original receipt, never a second financial record;
//! - stock and ledger consistency under concurrency is the store's problem,
//!   not the caller's.

pub mod contract;
pub mod memory;
pub mod pg;

pub use contract::{
    ListQuery, ProductCatalog, ReturnCommand, ReturnReceipt, ReturnRecord, SaleDraft, SalePage,
    SaleReceipt, SaleStore, VoidCommand, VoidReceipt,
};
pub use memory::MemoryStore;
pub use pg::{PgAuditSink, PgStore};
