//! API error taxonomy
//!
//! Every handler returns `Result<_, ApiError>`, so every request gets a
//! response. Upstream and internal failures are logged server-side and
//! redacted on the wire.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use scamguard_core::{PipelineError, StoreError, UpstreamError};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Auth(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("upstream failure: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m.clone()),
            ApiError::Auth(m) => (StatusCode::UNAUTHORIZED, m.clone()),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
            ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
            ApiError::Upstream(e) => {
                tracing::error!(error = %e, "upstream failure");
                (StatusCode::BAD_GATEWAY, "Upstream service failed".to_string())
            }
            ApiError::Internal(m) => {
                tracing::error!(error = %m, "internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UserNotFound => ApiError::NotFound("User not found".to_string()),
            StoreError::DuplicateEntry => {
                ApiError::Conflict("This entry is already reported.".to_string())
            }
            StoreError::NotFoundOrUnauthorized => {
                ApiError::NotFound("Entry not found or unauthorized".to_string())
            }
            StoreError::InvalidType(t) => ApiError::Validation(format!(
                "Value and valid type (phone/email/url) are required, got '{t}'"
            )),
            StoreError::Backend(m) => ApiError::Internal(m),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::EmptyPayload => {
                ApiError::Validation("Request payload is empty".to_string())
            }
            PipelineError::Upstream(e) => ApiError::Upstream(e),
            PipelineError::Store(e) => e.into(),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::Validation("x".into()), StatusCode::BAD_REQUEST),
            (ApiError::Auth("x".into()), StatusCode::UNAUTHORIZED),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (ApiError::Conflict("x".into()), StatusCode::CONFLICT),
            (
                ApiError::Upstream(UpstreamError::Unavailable("down".into())),
                StatusCode::BAD_GATEWAY,
            ),
            (ApiError::Internal("boom".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn test_duplicate_entry_maps_to_conflict() {
        let err: ApiError = StoreError::DuplicateEntry.into();
        assert!(matches!(err, ApiError::Conflict(_)));
    }

    #[test]
    fn test_merged_ownership_error_stays_merged() {
        let err: ApiError = StoreError::NotFoundOrUnauthorized.into();
        // one 404 for both "doesn't exist" and "not yours"
        assert!(matches!(err, ApiError::NotFound(_)));
    }
}
