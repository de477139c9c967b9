use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] surrealdb::Error),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Authorization error: {0}")]
    Authorization(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("File upload error: {0}")]
    FileUpload(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Validation error: {0}")]
    ValidatorError(#[from] validator::ValidationErrors),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, error_code) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Database error".to_string(), "DATABASE_ERROR")
            }
            AppError::Authentication(msg) => {
                (StatusCode::UNAUTHORIZED, msg.clone(), "AUTHENTICATION_ERROR")
            }
            AppError::Authorization(msg) => {
                (StatusCode::FORBIDDEN, msg.clone(), "AUTHORIZATION_ERROR")
            }
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "VALIDATION_ERROR")
            }
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, msg.clone(), "NOT_FOUND")
            }
            AppError::Conflict(msg) => {
                (StatusCode::CONFLICT, msg.clone(), "CONFLICT")
            }
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "BAD_REQUEST")
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string(), "INTERNAL_ERROR")
            }
            AppError::FileUpload(msg) => {
                (StatusCode::BAD_REQUEST, msg.clone(), "FILE_UPLOAD_ERROR")
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Serialization error".to_string(), "SERIALIZATION_ERROR")
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "IO error".to_string(), "IO_ERROR")
            }
            AppError::Jwt(e) => {
                tracing::debug!("JWT error: {}", e);
                (StatusCode::UNAUTHORIZED, "Invalid token".to_string(), "JWT_ERROR")
            }
            AppError::ValidatorError(e) => {
                let validation_errors = e
                    .field_errors()
                    .iter()
                    .map(|(field, errors)| {
                        (
                            field.to_string(),
                            errors
                                .iter()
                                .map(|e| {
                                    e.message
                                        .as_ref()
                                        .map(|m| m.to_string())
                                        .unwrap_or_else(|| "Invalid value".to_string())
                                })
                                .collect::<Vec<_>>(),
                        )
                    })
                    .collect::<std::collections::HashMap<String, Vec<String>>>();

                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({
                        "error": {
                            "code": "VALIDATION_ERROR",
                            "message": "Validation failed",
                            "details": validation_errors
                        }
                    })),
                )
                    .into_response();
            }
        };

        let body = Json(json!({
            "error": {
                "code": error_code,
                "message": error_message
            }
        }));

        (status, body).into_response()
    }
}

// 便利函数，用于创建常见错误
impl AppError {
    pub fn not_found(resource: &str) -> Self {
        Self::NotFound(format!("{} not found", resource))
    }

    pub fn bad_request(msg: &str) -> Self {
        Self::BadRequest(msg.to_string())
    }

    pub fn internal(msg: &str) -> Self {
        Self::Internal(msg.to_string())
    }

    pub fn validation(msg: &str) -> Self {
        Self::Validation(msg.to_string())
    }

    /// 唯一索引冲突（内嵌引擎与 HTTP 引擎返回的错误文本一致）
    pub fn is_unique_violation(err: &surrealdb::Error) -> bool {
        err.to_string().contains("already contains")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::not_found("Post").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::validation("Text is required").into_response().status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Authorization("Only the author can edit this post".to_string())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::internal("boom").into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_not_found_message() {
        let err = AppError::not_found("Group");
        assert_eq!(err.to_string(), "Not found: Group not found");
    }
}
