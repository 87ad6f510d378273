// studyroom-backend/src/error.rs

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;
use validator::ValidationErrors;

use crate::domain::share_link_model::ShareDenyReason;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DbErr(#[from] DbErr),

    #[error("Item not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Multiple validation errors")]
    ValidationErrors(Vec<String>),

    #[error("Failed to parse UUID: {0}")]
    UuidError(#[from] uuid::Error),

    #[error("Validation failed")]
    ValidationFailure(#[from] ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Share link access denied: {0}")]
    ShareLinkDenied(ShareDenyReason),

    #[error("Password required")]
    PasswordRequired,

    #[error("Incorrect password")]
    InvalidPassword,

    #[error("Too many requests: {message}")]
    TooManyRequests { message: String, retry_after_secs: u64 },

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("External service error: {0}")]
    ExternalServiceError(String),
}

// axum でエラーをHTTPレスポンスに変換するための実装
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match self {
            AppError::DbErr(db_err) => {
                // サーバーログには詳細を出すが、クライアントには汎用メッセージのみ返す
                tracing::error!(error = ?db_err, "Database error");

                let status = match db_err {
                    DbErr::RecordNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };

                let message = match &db_err {
                    DbErr::RecordNotFound(_) => "The requested resource was not found",
                    _ => "A database error occurred",
                };

                (
                    status,
                    ErrorResponse::new(message, "database_error"),
                )
            }
            AppError::NotFound(message) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new(&message, "not_found"),
            ),
            AppError::ValidationError(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(&message, "validation_error"),
            ),
            AppError::ValidationErrors(errors) => {
                let mut field_errors = HashMap::new();
                for error in &errors {
                    if let Some((field, message)) = error.split_once(": ") {
                        field_errors
                            .entry(field.to_string())
                            .or_insert_with(Vec::new)
                            .push(message.to_string());
                    }
                }
                let mut response = ErrorResponse::new("Validation failed", "validation_error");
                response.validation_errors = Some(field_errors);
                (StatusCode::BAD_REQUEST, response)
            }
            AppError::UuidError(err) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(&format!("Invalid UUID: {}", err), "validation_error"),
            ),
            AppError::ValidationFailure(errors) => {
                let field_errors: HashMap<String, Vec<String>> = errors
                    .field_errors()
                    .into_iter()
                    .map(|(field, errors)| {
                        let messages = errors
                            .iter()
                            .map(|e| {
                                e.message
                                    .as_ref()
                                    .map_or_else(|| "Invalid value".to_string(), |m| m.to_string())
                            })
                            .collect();
                        (field.to_string(), messages)
                    })
                    .collect();
                let mut response = ErrorResponse::new("Validation failed", "validation_error");
                response.validation_errors = Some(field_errors);
                (StatusCode::BAD_REQUEST, response)
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new(&message, "bad_request"),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(&message, "unauthorized"),
            ),
            AppError::Forbidden(message) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(&message, "forbidden"),
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorResponse::new(&message, "conflict"),
            ),
            AppError::ShareLinkDenied(reason) => (
                StatusCode::FORBIDDEN,
                ErrorResponse::new(reason.message(), reason.error_type()),
            ),
            AppError::PasswordRequired => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new(
                    "This share link is password protected",
                    "password_required",
                ),
            ),
            AppError::InvalidPassword => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("Incorrect password", "invalid_password"),
            ),
            AppError::TooManyRequests {
                message,
                retry_after_secs,
            } => {
                let mut response =
                    (StatusCode::TOO_MANY_REQUESTS, Json(ErrorResponse::new(&message, "rate_limited")))
                        .into_response();
                if let Ok(value) = retry_after_secs.to_string().parse() {
                    response.headers_mut().insert(header::RETRY_AFTER, value);
                }
                return response;
            }
            AppError::InternalServerError(message) => {
                tracing::error!(error = %message, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse::new(
                        "An internal server error occurred",
                        "internal_server_error",
                    ),
                )
            }
            AppError::ExternalServiceError(message) => {
                tracing::error!(error = %message, "External service error");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    ErrorResponse::new("External service error", "external_service_error"),
                )
            }
        };

        (status, Json(error_response)).into_response()
    }
}

// Result 型のエイリアス
pub type AppResult<T> = Result<T, AppError>;

/// 統一的なエラーレスポンス構造
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_errors: Option<HashMap<String, Vec<String>>>,
    pub error_type: String,
}

impl ErrorResponse {
    fn new(message: &str, error_type: &str) -> Self {
        Self {
            success: false,
            error: message.to_string(),
            message: message.to_string(),
            validation_errors: None,
            error_type: error_type.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn response_parts(error: AppError) -> (StatusCode, String) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = vec![
            (
                AppError::Unauthorized("Authentication required".to_string()),
                StatusCode::UNAUTHORIZED,
                "unauthorized",
            ),
            (
                AppError::Forbidden("Access denied".to_string()),
                StatusCode::FORBIDDEN,
                "forbidden",
            ),
            (
                AppError::NotFound("Document not found".to_string()),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                AppError::ValidationError("email: invalid".to_string()),
                StatusCode::BAD_REQUEST,
                "validation_error",
            ),
            (
                AppError::PasswordRequired,
                StatusCode::UNAUTHORIZED,
                "password_required",
            ),
            (
                AppError::InvalidPassword,
                StatusCode::UNAUTHORIZED,
                "invalid_password",
            ),
        ];

        for (error, expected_status, expected_type) in cases {
            let (status, body) = response_parts(error).await;
            assert_eq!(status, expected_status);
            assert!(body.contains(expected_type), "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_share_deny_reasons_map_to_forbidden() {
        for (reason, expected_type) in [
            (ShareDenyReason::Inactive, "inactive"),
            (ShareDenyReason::Expired, "expired"),
            (ShareDenyReason::ViewLimitExceeded, "view_limit_exceeded"),
            (ShareDenyReason::EmailMismatch, "email_mismatch"),
        ] {
            let (status, body) = response_parts(AppError::ShareLinkDenied(reason)).await;
            assert_eq!(status, StatusCode::FORBIDDEN);
            assert!(body.contains(expected_type), "body: {}", body);
        }
    }

    #[tokio::test]
    async fn test_too_many_requests_sets_retry_after() {
        let response = AppError::TooManyRequests {
            message: "Too many attempts. Please try again later.".to_string(),
            retry_after_secs: 42,
        }
        .into_response();

        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get(header::RETRY_AFTER).unwrap(), "42");
    }

    #[tokio::test]
    async fn test_internal_errors_do_not_leak_details() {
        // 接続文字列やパスワードを含む内部エラーがそのままクライアントに出ないこと
        let (status, body) = response_parts(AppError::InternalServerError(
            "connection refused: postgres://admin:password=secret@db:5432".to_string(),
        ))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("postgres://"));
        assert!(!body.contains("password="));
        assert!(body.contains("internal_server_error"));
    }

    #[tokio::test]
    async fn test_db_errors_are_genericized() {
        let (status, body) = response_parts(AppError::DbErr(DbErr::Custom(
            "FATAL: password authentication failed for postgres://user".to_string(),
        )))
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("postgres://"));
        assert!(body.contains("database_error"));
    }
}
