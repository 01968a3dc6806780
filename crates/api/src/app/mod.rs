//! HTTP API application wiring (Axum router + service wiring).
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (store, audit sink, coordinator)
//! - `routes/`: HTTP routes + handlers (one file per surface area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::limit::ConcurrencyLimitLayer;

use crate::middleware;

/// Upper bound on in-flight requests; downstream pools are bounded too, this
/// keeps the queue in front of them finite.
const MAX_IN_FLIGHT: usize = 1024;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full HTTP router from wired services (entrypoint for `main.rs`
/// and the black-box tests).
pub fn build_app(services: Arc<services::AppServices>, auth_state: middleware::AuthState) -> Router {
    // Protected routes: bearer verification + tenant resolution first.
    let protected = routes::router()
        .layer(Extension(services))
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            middleware::auth_middleware,
        ));

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
        .layer(ConcurrencyLimitLayer::new(MAX_IN_FLIGHT))
}
