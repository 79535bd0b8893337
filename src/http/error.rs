use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use crate::application::AppError;

pub type ApiResult<T> = Result<T, ApiError>;

/// Wrapper mapping the application error taxonomy onto HTTP statuses with a
/// JSON `{"error": ...}` body.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AppError::Validation(_)
            | AppError::UsernameTaken(_)
            | AppError::InvalidVoucherCode
            | AppError::VoucherInactive { .. }
            | AppError::InsufficientBalance { .. }
            | AppError::InvalidAmount(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCredentials
            | AppError::AuthenticationRequired
            | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::PermissionDenied => StatusCode::FORBIDDEN,
            AppError::VoucherNotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(err) => {
                tracing::error!(error = %err, "internal error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        ApiError(err).into_response().status()
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            status_of(AppError::InvalidAmount("x".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(AppError::InsufficientBalance {
                available: 100,
                requested: 200
            }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AppError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status_of(AppError::PermissionDenied),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AppError::VoucherNotFound("x".into())),
            StatusCode::NOT_FOUND
        );
    }
}
