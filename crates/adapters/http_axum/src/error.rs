//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use bandstand_domain::error::{AuthError, BandstandError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Maps [`BandstandError`] to an HTTP response with appropriate status code.
#[derive(Debug)]
pub struct ApiError(BandstandError);

impl From<BandstandError> for ApiError {
    fn from(err: BandstandError) -> Self {
        Self(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self(err.into())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        Self(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ValidationError::MalformedBody(rejection.body_text()).into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self.0 {
            BandstandError::Validation(err) => (StatusCode::BAD_REQUEST, err.to_string()),
            BandstandError::NotFound(err) => (StatusCode::NOT_FOUND, err.to_string()),
            BandstandError::Unauthenticated(err) => (StatusCode::UNAUTHORIZED, err.to_string()),
            BandstandError::Forbidden(err) => (StatusCode::FORBIDDEN, err.to_string()),
            BandstandError::Storage(err) => {
                tracing::error!(error = ?err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            BandstandError::Internal(err) => {
                tracing::error!(error = ?err, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
