//! Request authentication + tenant resolution.
//!
//! One middleware, two steps: verify the bearer credential, then resolve the
//! subject's profile and tenant into an immutable `SecurityContext`. The
//! context is inserted as a request extension; it is built exactly once per
//! request and never mutated afterwards.

use std::sync::Arc;

use axum::{
    extract::State,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use tillpoint_audit::RequestOrigin;
use tillpoint_auth::IdentityVerifier;
use tillpoint_core::DomainError;
use tillpoint_tenancy::{ProfileDirectory, resolve_context};

use crate::app::errors::domain_error_to_response;

#[derive(Clone)]
pub struct AuthState {
    pub verifier: Arc<dyn IdentityVerifier>,
    pub directory: Arc<dyn ProfileDirectory>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let token = extract_bearer(req.headers()).map_err(|e| domain_error_to_response(&e))?;

    let subject = state
        .verifier
        .verify(token)
        .await
        .map_err(|e| domain_error_to_response(&e))?;

    // Single chokepoint for lifecycle enforcement: every tenant-scoped route
    // runs through this resolution, none re-implements the checks.
    let ctx = resolve_context(state.directory.as_ref(), subject.subject_id, Utc::now())
        .await
        .map_err(|e| domain_error_to_response(&e))?;

    tracing::debug!(
        user = %ctx.user_id(),
        role = %ctx.role(),
        tenant = ?ctx.tenant_id(),
        "request authenticated"
    );

    let origin = origin_from_headers(req.headers());
    req.extensions_mut().insert(ctx);
    req.extensions_mut().insert(origin);

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, DomainError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(DomainError::AuthenticationFailed)?;

    let header = header
        .to_str()
        .map_err(|_| DomainError::AuthenticationFailed)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(DomainError::AuthenticationFailed)?
        .trim();

    if token.is_empty() {
        return Err(DomainError::AuthenticationFailed);
    }

    Ok(token)
}

fn origin_from_headers(headers: &HeaderMap) -> RequestOrigin {
    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    RequestOrigin {
        ip: header_str("x-forwarded-for"),
        user_agent: header_str("user-agent"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc.def.ghi"),
        );
        assert_eq!(extract_bearer(&headers).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_and_wrong_scheme_fail() {
        assert!(extract_bearer(&HeaderMap::new()).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Basic dXNlcjpwdw=="),
        );
        assert!(extract_bearer(&headers).is_err());
    }

    #[test]
    fn empty_token_fails() {
        let mut headers = HeaderMap::new();
        headers.insert(
            axum::http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer   "),
        );
        assert!(extract_bearer(&headers).is_err());
    }
}
