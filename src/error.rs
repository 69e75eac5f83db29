//! 统一的 API 错误类型与转换。

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::io::ErrorKind;

use crate::storage::StorageError;

#[derive(Debug)]
pub enum ApiError {
    Forbidden(String),
    UnsupportedMediaType(String),
    NoFilesSaved,
    NotFound(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg).into_response(),
            ApiError::UnsupportedMediaType(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NoFilesSaved => (
                StatusCode::BAD_REQUEST,
                "no file was received or the form is malformed",
            )
                .into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(error: StorageError) -> Self {
        match error {
            StorageError::Forbidden => {
                ApiError::Forbidden("attempt to access outside the shared directory".into())
            }
            StorageError::Io(err) => match err.kind() {
                ErrorKind::NotFound => ApiError::NotFound("file or directory not found".into()),
                _ => ApiError::Internal(err.to_string()),
            },
        }
    }
}
