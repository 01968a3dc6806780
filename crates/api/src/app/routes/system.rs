use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use tillpoint_tenancy::SecurityContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo of the resolved context, for diagnostics.
pub async fn whoami(Extension(ctx): Extension<SecurityContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "success",
        "data": {
            "user_id": ctx.user_id(),
            "email": ctx.email(),
            "full_name": ctx.full_name(),
            "role": ctx.role(),
            "tenant_id": ctx.tenant_id(),
            "tenant_name": ctx.tenant_name(),
            "is_super_admin": ctx.is_super_admin(),
        },
    }))
}
