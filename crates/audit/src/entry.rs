//! Audit entry model. Append-only: the application never updates or deletes
//! an entry once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use tillpoint_auth::Role;
use tillpoint_core::{AuditId, TenantId, UserId};

/// State-changing (or security-relevant) actions the trail records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    CreateSale,
    VoidSale,
    /// A denied void is itself security-relevant, not just a 403.
    VoidAttemptDenied,
    ProcessReturn,
    TrackPrint,
}

impl AuditAction {
    pub fn as_str(self) -> &'static str {
        match self {
            AuditAction::CreateSale => "CREATE_SALE",
            AuditAction::VoidSale => "VOID_SALE",
            AuditAction::VoidAttemptDenied => "VOID_ATTEMPT_DENIED",
            AuditAction::ProcessReturn => "PROCESS_RETURN",
            AuditAction::TrackPrint => "TRACK_PRINT",
        }
    }
}

/// Where the request came from, as far as the HTTP layer can tell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOrigin {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub actor_id: UserId,
    pub actor_role: Role,
    pub tenant_id: Option<TenantId>,
    pub action: AuditAction,
    pub entity_type: String,
    pub entity_id: String,
    pub changes: Option<Value>,
    pub origin: RequestOrigin,
    pub recorded_at: DateTime<Utc>,
}

impl AuditEntry {
    pub fn new(
        actor_id: UserId,
        actor_role: Role,
        tenant_id: Option<TenantId>,
        action: AuditAction,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        changes: Option<Value>,
        origin: RequestOrigin,
    ) -> Self {
        Self {
            id: AuditId::new(),
            actor_id,
            actor_role,
            tenant_id,
            action,
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            changes,
            origin,
            recorded_at: Utc::now(),
        }
    }
}
