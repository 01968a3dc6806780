//! Infrastructure wiring: which collaborators back the coordinator.
//!
//! Two modes. With `DATABASE_URL` set, everything runs against Postgres and
//! its atomic procedures. Without it, an in-memory store backs the same
//! contracts — used by the tests and handy for local development, with the
//! same idempotency and scoping semantics.

use std::sync::Arc;

use tillpoint_audit::{AuditRecorder, AuditSink, InMemoryAuditSink};
use tillpoint_auth::Hs256IdentityVerifier;
use tillpoint_checkout::Coordinator;
use tillpoint_store::{MemoryStore, PgAuditSink, PgStore};

use crate::middleware::AuthState;

/// Everything the handlers need, built once at startup.
pub struct AppServices {
    pub coordinator: Coordinator,
}

impl AppServices {
    pub fn audit_sink(&self) -> &Arc<dyn AuditSink> {
        self.coordinator.audit().sink()
    }
}

/// Production wiring: Postgres store, Postgres audit trail.
pub async fn build_pg_services(
    database_url: &str,
    jwt_secret: &[u8],
) -> anyhow::Result<(Arc<AppServices>, AuthState)> {
    let store = Arc::new(PgStore::connect(database_url).await?);
    let audit = AuditRecorder::new(Arc::new(PgAuditSink::new(store.pool().clone())));
    let coordinator = Coordinator::new(store.clone(), store.clone(), audit);

    let auth = AuthState {
        verifier: Arc::new(Hs256IdentityVerifier::new(jwt_secret)),
        directory: store,
    };
    Ok((Arc::new(AppServices { coordinator }), auth))
}

/// In-memory wiring. Returns the store handle so callers (tests, a dev seed
/// step) can insert tenants, profiles, and products directly.
pub fn build_memory_services(jwt_secret: &[u8]) -> (Arc<AppServices>, AuthState, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let audit = AuditRecorder::new(Arc::new(InMemoryAuditSink::new()));
    let coordinator = Coordinator::new(store.clone(), store.clone(), audit);

    let auth = AuthState {
        verifier: Arc::new(Hs256IdentityVerifier::new(jwt_secret)),
        directory: store.clone(),
    };
    (Arc::new(AppServices { coordinator }), auth, store)
}
