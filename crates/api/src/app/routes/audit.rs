use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::Response};
use serde_json::json;

use tillpoint_auth::allowed;
use tillpoint_core::DomainError;
use tillpoint_sales::VOID_ROLES;
use tillpoint_tenancy::SecurityContext;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

/// Audit-trail listing. Managers and above; platform actors see every tenant,
/// everyone else only their own.
pub async fn list_audit_entries(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
) -> Response {
    if !allowed(ctx.role(), VOID_ROLES) {
        return errors::domain_error_to_response(&DomainError::InsufficientRole {
            required: VOID_ROLES.iter().map(|r| r.as_str()).collect(),
        });
    }

    let tenant_filter = if ctx.is_super_admin() {
        None
    } else {
        ctx.tenant_id()
    };

    match services.audit_sink().entries(tenant_filter).await {
        Ok(entries) => errors::success(
            StatusCode::OK,
            json!({
                "results": entries.iter().map(dto::audit_json).collect::<Vec<_>>(),
                "total": entries.len(),
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}
