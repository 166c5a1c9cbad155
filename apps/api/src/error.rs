use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::error;
use wordhoard_core::AppError;

mod types;

pub use types::{ErrorCode, ErrorResponse};

const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

/// HTTP API error wrapper around core application errors.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(value: AppError) -> Self {
        Self(value)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            AppError::Validation { .. } | AppError::InvalidCredential(_) => {
                StatusCode::BAD_REQUEST
            }
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> ErrorCode {
        match self.0 {
            AppError::Validation { .. } => ErrorCode::Validation,
            AppError::InvalidCredential(_) => ErrorCode::InvalidCredential,
            AppError::NotFound(_) => ErrorCode::NotFound,
            AppError::Conflict(_) => ErrorCode::Conflict,
            AppError::Unauthorized(_) => ErrorCode::Unauthorized,
            AppError::Internal(_) => ErrorCode::Internal,
        }
    }

    fn payload(self) -> ErrorResponse {
        let code = self.code();
        match self.0 {
            AppError::Internal(detail) => {
                error!(%detail, "request failed with internal error");
                ErrorResponse::new(code, INTERNAL_ERROR_MESSAGE.to_owned(), None)
            }
            AppError::Validation { field, message } => ErrorResponse::new(code, message, field),
            AppError::NotFound(message)
            | AppError::Conflict(message)
            | AppError::Unauthorized(message)
            | AppError::InvalidCredential(message) => ErrorResponse::new(code, message, None),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(self.payload())).into_response()
    }
}

/// Standard API result type.
pub type ApiResult<T> = Result<T, ApiError>;
