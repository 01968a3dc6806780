//! Error → HTTP response mapping.
//!
//! Every handler funnels `DomainError` through here so the status mapping and
//! the `{status, message}` envelope stay in one place. Store-side failures
//! reach the client sanitized; their details are already logged where they
//! occurred.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use tillpoint_core::DomainError;

pub fn domain_error_to_response(err: &DomainError) -> axum::response::Response {
    let status = match err {
        DomainError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
        DomainError::ProfileNotFound
        | DomainError::AccountDisabled
        | DomainError::TenantMissing
        | DomainError::TenantSuspended
        | DomainError::TenantCancelled
        | DomainError::SubscriptionExpired
        | DomainError::InsufficientRole { .. } => StatusCode::FORBIDDEN,
        DomainError::ValidationFailed { .. } | DomainError::AlreadyVoided => {
            StatusCode::BAD_REQUEST
        }
        DomainError::NotFoundOrForbidden => StatusCode::NOT_FOUND,
        DomainError::TenantContextMissing => StatusCode::INTERNAL_SERVER_ERROR,
        DomainError::DelegateRejected { .. } => StatusCode::CONFLICT,
        DomainError::StoreUnavailable => StatusCode::BAD_GATEWAY,
    };

    let mut body = json!({
        "status": "error",
        "message": err.to_string(),
    });

    match err {
        DomainError::ValidationFailed { field, .. } => {
            body["field"] = json!(field);
        }
        DomainError::InsufficientRole { required } => {
            body["required_roles"] = json!(required);
        }
        _ => {}
    }

    (status, axum::Json(body)).into_response()
}

/// Success envelope: `{"status": "success", "data": …}`.
pub fn success(status: StatusCode, data: serde_json::Value) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "status": "success",
            "data": data,
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = [
            (DomainError::AuthenticationFailed, StatusCode::UNAUTHORIZED),
            (DomainError::ProfileNotFound, StatusCode::FORBIDDEN),
            (DomainError::SubscriptionExpired, StatusCode::FORBIDDEN),
            (DomainError::NotFoundOrForbidden, StatusCode::NOT_FOUND),
            (DomainError::AlreadyVoided, StatusCode::BAD_REQUEST),
            (
                DomainError::validation("items", "empty"),
                StatusCode::BAD_REQUEST,
            ),
            (
                DomainError::delegate_rejected("stock race"),
                StatusCode::CONFLICT,
            ),
            (DomainError::StoreUnavailable, StatusCode::BAD_GATEWAY),
            (
                DomainError::TenantContextMissing,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(domain_error_to_response(&err).status(), expected, "{err:?}");
        }
    }
}
