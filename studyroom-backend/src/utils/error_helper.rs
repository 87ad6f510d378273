// studyroom-backend/src/utils/error_helper.rs

//! エラーハンドリングの統一化ヘルパー
//!
//! サービス層とハンドラー層で共通して使用するエラー処理パターンを提供します。

use crate::error::AppError;
use tracing::{error, warn};
use validator::ValidationErrors;

/// validatorのValidationErrorsをAppErrorに変換する統一処理
pub fn convert_validation_errors(validation_errors: ValidationErrors, context: &str) -> AppError {
    warn!(
        context = %context,
        error_count = validation_errors.field_errors().len(),
        "Validation failed"
    );

    let errors: Vec<String> = validation_errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map_or_else(|| "Invalid value".to_string(), |cow| cow.to_string());
                format!("{}: {}", field, message)
            })
        })
        .collect();

    AppError::ValidationErrors(errors)
}

/// 単一のバリデーションエラーメッセージを生成
pub fn validation_error(field: &str, message: &str) -> AppError {
    AppError::ValidationError(format!("{}: {}", field, message))
}

/// 内部サーバーエラーをログ付きで生成
pub fn internal_server_error<E: std::fmt::Display>(
    error: E,
    context: &str,
    user_message: &str,
) -> AppError {
    error!(
        error = %error,
        context = %context,
        "Internal server error occurred"
    );
    AppError::InternalServerError(user_message.to_string())
}

/// 権限エラーをログ付きで生成
#[allow(dead_code)]
pub fn unauthorized_error(message: &str, context: &str) -> AppError {
    warn!(
        context = %context,
        message = %message,
        "Unauthorized access attempt"
    );
    AppError::Unauthorized(message.to_string())
}

/// 禁止エラーをログ付きで生成
#[allow(dead_code)]
pub fn forbidden_error(message: &str, context: &str, user_id: Option<&str>) -> AppError {
    warn!(
        context = %context,
        message = %message,
        user_id = user_id.unwrap_or("unknown"),
        "Forbidden access attempt"
    );
    AppError::Forbidden(message.to_string())
}

/// リソース未発見エラーをログ付きで生成
pub fn not_found_error(resource: &str, identifier: &str, context: &str) -> AppError {
    warn!(
        context = %context,
        resource = %resource,
        identifier = %identifier,
        "Resource not found"
    );
    AppError::NotFound(format!("{} not found", resource))
}

/// 競合エラーをログ付きで生成
#[allow(dead_code)]
pub fn conflict_error(message: &str, context: &str) -> AppError {
    warn!(
        context = %context,
        message = %message,
        "Resource conflict occurred"
    );
    AppError::Conflict(message.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct TestStruct {
        #[validate(length(min = 3, max = 10))]
        name: String,
        #[validate(email)]
        email: String,
    }

    #[test]
    fn test_convert_validation_errors() {
        let test_data = TestStruct {
            name: "ab".to_string(),             // too short
            email: "invalid-email".to_string(), // invalid format
        };

        let validation_errors = test_data.validate().unwrap_err();
        let app_error = convert_validation_errors(validation_errors, "test");

        match app_error {
            AppError::ValidationErrors(errors) => {
                assert!(!errors.is_empty());
                assert!(errors.iter().any(|e| e.contains("name")));
                assert!(errors.iter().any(|e| e.contains("email")));
            }
            _ => panic!("Expected ValidationErrors"),
        }
    }

    #[test]
    fn test_validation_error() {
        let error = validation_error("email", "Email is required");
        match error {
            AppError::ValidationError(message) => {
                assert_eq!(message, "email: Email is required");
            }
            _ => panic!("Expected ValidationError"),
        }
    }

    #[test]
    fn test_not_found_error_hides_identifier_context() {
        let error = not_found_error("Document", "123", "document service");
        match error {
            AppError::NotFound(message) => {
                assert_eq!(message, "Document not found");
            }
            _ => panic!("Expected NotFound error"),
        }
    }
}
