use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use serde_json::json;

use tillpoint_audit::RequestOrigin;
use tillpoint_auth::allowed;
use tillpoint_core::{DomainError, SaleId};
use tillpoint_sales::VOID_ROLES;
use tillpoint_tenancy::SecurityContext;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/voided", get(list_voided))
        .route("/:id/void", post(void_invoice))
        .route("/:id/print", post(track_print))
}

pub async fn void_invoice(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(origin): Extension<RequestOrigin>,
    Path(id): Path<String>,
    Json(body): Json<dto::VoidRequest>,
) -> Response {
    let id: SaleId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services
        .coordinator
        .void_sale(&ctx, id, &body.reason, body.manager_id, body.auth_code, origin)
        .await
    {
        Ok(receipt) => errors::success(
            StatusCode::OK,
            json!({
                "sale_id": receipt.sale_id,
                "invoice_number": receipt.invoice_number,
                "voided_at": receipt.voided_at,
                "items_affected": receipt.items_affected,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

/// Voided-sale listing with a void-amount summary. Managers and above.
pub async fn list_voided(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Query(params): Query<dto::ListParams>,
) -> Response {
    if !allowed(ctx.role(), VOID_ROLES) {
        return errors::domain_error_to_response(&DomainError::InsufficientRole {
            required: VOID_ROLES.iter().map(|r| r.as_str()).collect(),
        });
    }

    let query = params.to_query(true);
    match services.coordinator.list_sales(&ctx, query).await {
        Ok(page) => errors::success(
            StatusCode::OK,
            json!({
                "results": page.sales.iter().map(dto::sale_json).collect::<Vec<_>>(),
                "total": page.total,
                "page": query.page,
                // Summed over every matching voided sale, not just this page.
                "voided_amount": page.total_amount,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

pub async fn track_print(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(origin): Extension<RequestOrigin>,
    Path(id): Path<String>,
) -> Response {
    let id: SaleId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services.coordinator.track_print(&ctx, id, origin).await {
        Ok(count) => errors::success(StatusCode::OK, json!({ "print_count": count })),
        Err(e) => errors::domain_error_to_response(&e),
    }
}
