//! `tillpoint-audit` — append-only audit trail, written fire-and-forget.
//!
//! An audit write failure can never abort or roll back the operation that
//! produced it: the write happens on a spawned task and failures are logged
//! locally and swallowed.

pub mod entry;
pub mod recorder;

pub use entry::{AuditAction, AuditEntry, RequestOrigin};
pub use recorder::{AuditRecorder, AuditSink, InMemoryAuditSink};
