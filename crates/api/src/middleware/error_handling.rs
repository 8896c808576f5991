//! # Error Handling Middleware
//!
//! This module provides a standardized way to handle errors in the MedShare API.
//! It maps domain-specific errors to appropriate HTTP status codes and JSON
//! error responses, ensuring a consistent error handling experience across
//! the entire API.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use medshare_core::errors::ShareError;
use serde_json::json;

/// Application error wrapper that provides HTTP status code mapping
///
/// `AppError` wraps domain-specific `ShareError` instances and implements
/// `IntoResponse` to convert them into HTTP responses with appropriate
/// status codes and JSON payloads.
///
/// # Example
///
/// ```
/// use axum::Json;
/// use medshare_api::middleware::error_handling::AppError;
/// use medshare_core::errors::ShareError;
///
/// async fn handler(name: Option<String>) -> Result<Json<String>, AppError> {
///     let name = name.ok_or_else(|| ShareError::Validation("name is required".to_string()))?;
///     Ok(Json(name))
/// }
/// # fn main() {}
/// ```
#[derive(Debug)]
pub struct AppError(pub ShareError);

impl AppError {
    pub fn status(&self) -> StatusCode {
        match &self.0 {
            ShareError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            ShareError::InvalidRange(_) => StatusCode::BAD_REQUEST,
            ShareError::Validation(_) => StatusCode::BAD_REQUEST,
            ShareError::NotFound(_) => StatusCode::NOT_FOUND,
            ShareError::Conflict(_) => StatusCode::CONFLICT,
            ShareError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ShareError::Authorization(_) => StatusCode::FORBIDDEN,
            ShareError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ShareError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = ?self.0, "Request failed");
        }

        // Get the error message and format as JSON
        let message = self.0.to_string();
        let body = Json(json!({ "error": message }));

        (status, body).into_response()
    }
}

/// Allows `?` on `ShareResult` inside handlers returning `Result<T, AppError>`.
impl From<ShareError> for AppError {
    fn from(err: ShareError) -> Self {
        AppError(err)
    }
}

/// Persistence failures surface as `ShareError::Database`.
impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        AppError(ShareError::Database(err))
    }
}
