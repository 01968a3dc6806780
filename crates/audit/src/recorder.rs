//! Fire-and-forget audit recorder.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use tillpoint_core::{DomainResult, TenantId};

use crate::entry::AuditEntry;

/// Append-only audit sink.
#[async_trait]
pub trait AuditSink: Send + Sync {
    async fn append(&self, entry: AuditEntry) -> DomainResult<()>;

    /// Tenant-scoped read of the trail, newest first. `None` tenant reads all
    /// (platform actors only; the caller enforces that).
    async fn entries(&self, tenant_id: Option<TenantId>) -> DomainResult<Vec<AuditEntry>>;
}

/// Hands entries to the sink on a spawned task; never blocks, never fails the
/// caller.
#[derive(Clone)]
pub struct AuditRecorder {
    sink: Arc<dyn AuditSink>,
}

impl AuditRecorder {
    pub fn new(sink: Arc<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Record an entry without awaiting the write.
    pub fn record(&self, entry: AuditEntry) {
        let sink = Arc::clone(&self.sink);
        tokio::spawn(async move {
            let action = entry.action;
            if let Err(err) = sink.append(entry).await {
                // Swallowed: the primary operation already succeeded.
                tracing::warn!(?action, %err, "failed to write audit entry");
            }
        });
    }

    /// Record and wait for the write; used where the trail itself is the
    /// operation under test.
    pub async fn record_now(&self, entry: AuditEntry) {
        let action = entry.action;
        if let Err(err) = self.sink.append(entry).await {
            tracing::warn!(?action, %err, "failed to write audit entry");
        }
    }

    pub fn sink(&self) -> &Arc<dyn AuditSink> {
        &self.sink
    }
}

/// Mutex-guarded in-memory sink for tests and the no-database dev mode.
#[derive(Default)]
pub struct InMemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl InMemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditSink for InMemoryAuditSink {
    async fn append(&self, entry: AuditEntry) -> DomainResult<()> {
        self.entries.lock().expect("audit sink poisoned").push(entry);
        Ok(())
    }

    async fn entries(&self, tenant_id: Option<TenantId>) -> DomainResult<Vec<AuditEntry>> {
        let entries = self.entries.lock().expect("audit sink poisoned");
        let mut out: Vec<_> = entries
            .iter()
            .filter(|e| tenant_id.is_none() || e.tenant_id == tenant_id)
            .cloned()
            .collect();
        out.reverse();
        Ok(out)
    }
}
