use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use crucible_core::errors::{FieldErrors, RunRequestError, UploadError};

#[derive(Debug)]
pub enum ApiError {
    /// 400 with the field-keyed message map as the body.
    Validation(FieldErrors),
    /// 400 for malformed requests that never reach field validation.
    BadRequest(String),
    /// 404, status only.
    NotFound,
    /// 502: the record was created but the runner hand-off failed.
    BadGateway(String),
    /// 500; the cause is logged, not returned.
    Internal,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn internal(error: anyhow::Error) -> Self {
        tracing::error!(error = format!("{error:#}"), "internal error");
        Self::Internal
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        Self::internal(error)
    }
}

impl From<UploadError> for ApiError {
    fn from(error: UploadError) -> Self {
        match error {
            UploadError::Validation(errors) => Self::Validation(errors),
            UploadError::Internal(e) => Self::internal(e),
        }
    }
}

impl From<RunRequestError> for ApiError {
    fn from(error: RunRequestError) -> Self {
        match error {
            RunRequestError::Validation(errors) => Self::Validation(errors),
            RunRequestError::NotFound(_) => Self::NotFound,
            RunRequestError::Dispatch(_) => Self::BadGateway("failed to notify runner".to_string()),
            RunRequestError::Internal(e) => Self::internal(e),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "detail": message })),
            )
                .into_response(),
            ApiError::NotFound => StatusCode::NOT_FOUND.into_response(),
            ApiError::BadGateway(message) => (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({ "detail": message })),
            )
                .into_response(),
            ApiError::Internal => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "detail": "internal server error" })),
            )
                .into_response(),
        }
    }
}
