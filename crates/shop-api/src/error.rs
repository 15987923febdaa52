//! API error handling
//!
//! The internal taxonomy ([`ShopError`]) is collapsed into client-visible
//! status codes and messages by a single mapping, [`AppError::status_and_message`].
//! Storage and unknown failures are logged in full and reported generically.
//!
//! Author: hephaex@gmail.com

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use shop_core::ShopError;
use utoipa::ToSchema;

/// Error body used by the auth endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code
    pub code: String,
    /// Human-readable message
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Error body used by the product endpoints
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ResourceErrorBody {
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub struct AppError(pub ShopError);

impl AppError {
    pub fn unauthorized() -> Self {
        Self(ShopError::Unauthorized)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self(ShopError::ValidationError(message.into()))
    }

    /// Map the internal error to what the client is allowed to see
    pub fn status_and_message(&self) -> (StatusCode, &'static str, String) {
        match &self.0 {
            ShopError::MissingFields(_) => {
                (StatusCode::BAD_REQUEST, "MISSING_FIELDS", "Missing fields".to_string())
            }
            ShopError::DuplicateUser => (
                StatusCode::BAD_REQUEST,
                "DUPLICATE_USER",
                "User already exists".to_string(),
            ),
            ShopError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone())
            }
            ShopError::UserNotFound => {
                (StatusCode::NOT_FOUND, "USER_NOT_FOUND", "User not found".to_string())
            }
            ShopError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", "Not found".to_string()),
            ShopError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            ShopError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", "Unauthorized".to_string())
            }
            ShopError::StorageFailure(_) | ShopError::Other(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "Internal server error".to_string(),
            ),
        }
    }

    fn log_if_internal(&self) {
        match &self.0 {
            ShopError::StorageFailure(detail) => {
                tracing::error!(error = %detail, "Storage failure");
            }
            ShopError::Other(err) => {
                tracing::error!(error = ?err, "Unhandled failure");
            }
            _ => {}
        }
    }
}

impl From<ShopError> for AppError {
    fn from(err: ShopError) -> Self {
        Self(err)
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self(ShopError::Other(err))
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log_if_internal();
        let (status, code, message) = self.status_and_message();
        (status, Json(ApiError::new(code, message))).into_response()
    }
}

/// [`AppError`] rendered with the `{ "error": ... }` body of the product routes
#[derive(Debug)]
pub struct ResourceError(pub AppError);

impl<E: Into<AppError>> From<E> for ResourceError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ResourceError {
    fn into_response(self) -> Response {
        self.0.log_if_internal();
        let (status, _, message) = self.0.status_and_message();
        (status, Json(ResourceErrorBody { error: message })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(err: ShopError) -> StatusCode {
        AppError(err).status_and_message().0
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(status(ShopError::MissingFields("email".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ShopError::DuplicateUser), StatusCode::BAD_REQUEST);
        assert_eq!(status(ShopError::ValidationError("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status(ShopError::UserNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ShopError::NotFound("p".into())), StatusCode::NOT_FOUND);
        assert_eq!(status(ShopError::InvalidCredentials), StatusCode::UNAUTHORIZED);
        assert_eq!(status(ShopError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(
            status(ShopError::StorageFailure("db down".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let err = AppError(ShopError::StorageFailure(
            "connection to 10.0.0.5:5432 refused".into(),
        ));
        let (_, code, message) = err.status_and_message();
        assert_eq!(code, "INTERNAL_ERROR");
        assert!(!message.contains("10.0.0.5"));

        let err = AppError(ShopError::Other(anyhow::anyhow!("secret stack detail")));
        assert!(!err.status_and_message().2.contains("secret"));
    }

    #[test]
    fn test_missing_fields_detail_not_exposed() {
        let (_, _, message) =
            AppError(ShopError::MissingFields("password".into())).status_and_message();
        assert_eq!(message, "Missing fields");
    }

    #[tokio::test]
    async fn test_resource_error_body() {
        let response = ResourceError(AppError::unauthorized()).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Unauthorized");
    }
}
