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
use tillpoint_core::SaleId;
use tillpoint_tenancy::SecurityContext;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_order).get(list_orders))
        .route("/:id", get(get_order))
}

pub async fn create_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(origin): Extension<RequestOrigin>,
    Json(body): Json<dto::CreateOrderRequest>,
) -> Response {
    let (request, explicit_tenant) = match body.into_domain() {
        Ok(parts) => parts,
        Err(e) => return errors::domain_error_to_response(&e),
    };

    match services
        .coordinator
        .create_sale(&ctx, request, explicit_tenant, origin)
        .await
    {
        Ok(receipt) => errors::success(
            StatusCode::CREATED,
            json!({
                "sale_id": receipt.sale_id,
                "invoice_number": receipt.invoice_number,
                "total_amount": receipt.total,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Query(params): Query<dto::ListParams>,
) -> Response {
    let query = params.to_query(false);
    match services.coordinator.list_sales(&ctx, query).await {
        Ok(page) => errors::success(
            StatusCode::OK,
            json!({
                "results": page.sales.iter().map(dto::sale_json).collect::<Vec<_>>(),
                "total": page.total,
                "page": query.page,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Path(id): Path<String>,
) -> Response {
    let id: SaleId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    match services.coordinator.sale(&ctx, id).await {
        Ok(sale) => errors::success(StatusCode::OK, dto::sale_json(&sale)),
        Err(e) => errors::domain_error_to_response(&e),
    }
}
