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
use tillpoint_core::ReturnId;
use tillpoint_sales::ReturnRequest;
use tillpoint_tenancy::SecurityContext;

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_return).get(list_returns))
        .route("/:id", get(get_return))
}

pub async fn create_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Extension(origin): Extension<RequestOrigin>,
    Json(body): Json<dto::CreateReturnRequest>,
) -> Response {
    let request = ReturnRequest {
        sale_id: body.sale_id,
        items: body.items,
        reason: body.reason,
    };

    match services.coordinator.process_return(&ctx, request, origin).await {
        Ok(receipt) => errors::success(
            StatusCode::CREATED,
            json!({
                "return_id": receipt.return_id,
                "sale_id": receipt.sale_id,
                "refund_amount": receipt.refund_amount,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

pub async fn list_returns(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Query(params): Query<dto::ListParams>,
) -> Response {
    let query = params.to_query(false);
    match services.coordinator.list_returns(&ctx, query).await {
        Ok((records, total)) => errors::success(
            StatusCode::OK,
            json!({
                "results": records.iter().map(dto::return_json).collect::<Vec<_>>(),
                "total": total,
                "page": query.page,
            }),
        ),
        Err(e) => errors::domain_error_to_response(&e),
    }
}

pub async fn get_return(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(ctx): Extension<SecurityContext>,
    Path(id): Path<String>,
) -> Response {
    let id: ReturnId = match id.parse() {
        Ok(id) => id,
        Err(e) => return errors::domain_error_to_response(&e),
    };
    match services.coordinator.return_record(&ctx, id).await {
        Ok(record) => errors::success(StatusCode::OK, dto::return_json(&record)),
        Err(e) => errors::domain_error_to_response(&e),
    }
}
