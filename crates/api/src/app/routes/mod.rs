use axum::{Router, routing::get};

pub mod audit;
pub mod invoices;
pub mod orders;
pub mod returns;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/invoices", invoices::router())
        .nest("/returns", returns::router())
        .route("/audit", get(audit::list_audit_entries))
}
