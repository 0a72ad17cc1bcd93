use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use workhub_auth::AuthzError;
use workhub_core::DomainError;
use workhub_infra::{ServiceError, StoreError};

/// Map a service failure to a response.
///
/// `NotFound` and `Forbidden` produce the same body; only the log line differs.
pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match &err {
        ServiceError::Authz(e) if e.is_concealed() => {
            tracing::debug!(denial = e.internal_kind(), detail = %e, "request denied");
            not_found()
        }
        ServiceError::Authz(e) => {
            tracing::debug!(denial = e.internal_kind(), detail = %e, "request denied");
            let status = match e {
                AuthzError::InvalidAssignee { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                AuthzError::RoleInsufficient { .. } => StatusCode::FORBIDDEN,
                AuthzError::ConflictOnCascade(_) => StatusCode::CONFLICT,
                AuthzError::NotFound { .. } | AuthzError::Forbidden { .. } => StatusCode::NOT_FOUND,
            };
            json_error(status, e.reason_code(), e.to_string())
        }
        ServiceError::Domain(DomainError::Validation(msg)) | ServiceError::Domain(DomainError::InvalidId(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg.clone())
        }
        ServiceError::Domain(DomainError::InvariantViolation(msg)) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg.clone())
        }
        ServiceError::Domain(DomainError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg.clone()),
        ServiceError::Store(StoreError::UniqueViolation(msg)) => {
            json_error(StatusCode::CONFLICT, "conflict", msg.clone())
        }
        ServiceError::Store(e) => {
            tracing::error!(error = %e, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", "storage failure")
        }
    }
}

/// The single response for unknown and inaccessible entities alike.
pub fn not_found() -> axum::response::Response {
    json_error(StatusCode::NOT_FOUND, "not_found", "not found")
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
