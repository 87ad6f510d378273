// studyroom-backend/src/api/dto/auth_dto.rs

use crate::domain::user_model::SafeUser;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// サインアップリクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct SignupRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// サインインリクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// パスワードリセット要求リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,
}

/// パスワードリセット実行リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,

    #[validate(length(min = 1, message = "New password is required"))]
    pub new_password: String,
}

/// メール認証リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct VerifyEmailRequest {
    #[validate(length(min = 1, message = "Token is required"))]
    pub token: String,
}

/// 認証レスポンス
#[derive(Serialize, Debug)]
pub struct AuthResponse {
    pub user: SafeUser,
    pub access_token: String,
    pub token_type: String,
}

/// メッセージのみのレスポンス
#[derive(Serialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}
