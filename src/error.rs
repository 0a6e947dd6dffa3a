/*
 * Responsibility
 * - アプリ共通の AppError 定義
 * - IntoResponse 実装 (HTTP status / JSON error body)
 * - RepoError / auth error を統一的に変換
 *
 * Body shape: { "error": <reason phrase>, "message": <text>, "statusCode": <u16> }
 */
use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::repos::error::RepoError;

/// Message shared by every authentication failure, so a caller cannot tell
/// which part of the credential was wrong.
pub const INVALID_AUTHORIZATION_HEADER: &str = "invalid authorization header";

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: &'static str,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    // Scope failures render as 401, same as authentication failures.
    #[error("You do not have permission to perform an HTTP {method} request on this route")]
    ScopeDenied { method: String },
    #[error("{0}")]
    NotFound(String),
    #[error("Not Acceptable")]
    NotAcceptable,
    #[error("{0}")]
    UnsupportedMediaType(String),
    #[error("Request body is too large")]
    PayloadTooLarge,
    #[error("Too Many Requests")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("Request Timeout")]
    RequestTimeout,
    #[error("Internal Server Error")]
    Internal,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn invalid_authorization_header() -> Self {
        Self::Unauthorized(INVALID_AUTHORIZATION_HEADER.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) | AppError::ScopeDenied { .. } => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::NotAcceptable => StatusCode::NOT_ACCEPTABLE,
            AppError::UnsupportedMediaType(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            AppError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
            status_code: status.as_u16(),
        };

        let mut res = (status, Json(body)).into_response();
        if let AppError::TooManyRequests { retry_after_secs } = self
            && let Ok(v) = HeaderValue::from_str(&retry_after_secs.to_string())
        {
            res.headers_mut().insert(header::RETRY_AFTER, v);
        }
        res
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        // Raw driver text stays in the log.
        tracing::error!(error = ?e, "database operation failed");
        AppError::Internal
    }
}
