// studyroom-backend/src/service/auth_service.rs

use crate::api::dto::auth_dto::{
    AuthResponse, ForgotPasswordRequest, MessageResponse, ResetPasswordRequest, SigninRequest,
    SignupRequest, VerifyEmailRequest,
};
use crate::db::DbPool;
use crate::domain::auth_token_model::{CreateAuthToken, TokenPurpose, TokenValidationError};
use crate::domain::role::RoleName;
use crate::error::{AppError, AppResult};
use crate::repository::auth_token_repository::AuthTokenRepository;
use crate::repository::user_repository::{CreateUserDto, UserRepository};
use crate::utils::email::EmailService;
use crate::utils::error_helper::convert_validation_errors;
use crate::utils::jwt::JwtManager;
use crate::utils::password::PasswordManager;
use crate::utils::token::{generate_secure_token, hash_token};
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

/// 認証トークンの生の長さ
const AUTH_TOKEN_LENGTH: usize = 32;

pub struct AuthService {
    user_repo: Arc<UserRepository>,
    auth_token_repo: Arc<AuthTokenRepository>,
    password_manager: Arc<PasswordManager>,
    jwt_manager: Arc<JwtManager>,
    email_service: Arc<EmailService>,
}

impl AuthService {
    pub fn new(
        db_pool: DbPool,
        password_manager: Arc<PasswordManager>,
        jwt_manager: Arc<JwtManager>,
        email_service: Arc<EmailService>,
    ) -> Self {
        Self {
            user_repo: Arc::new(UserRepository::new(db_pool.clone())),
            auth_token_repo: Arc::new(AuthTokenRepository::new(db_pool)),
            password_manager,
            jwt_manager,
            email_service,
        }
    }

    // --- サインアップ / サインイン ---

    pub async fn signup(&self, signup_data: SignupRequest) -> AppResult<AuthResponse> {
        signup_data
            .validate()
            .map_err(|e| convert_validation_errors(e, "auth_service::signup"))?;

        if self
            .user_repo
            .find_by_email(&signup_data.email)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "An account with this email already exists".to_string(),
            ));
        }

        // 強度チェックはハッシュ化に含まれる
        let password_hash = self
            .password_manager
            .hash_password(&signup_data.password)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let user = self
            .user_repo
            .create(CreateUserDto {
                email: signup_data.email,
                password_hash,
                role: RoleName::PlatformUser.as_str().to_string(),
            })
            .await?;

        info!(user_id = %user.id, "User signed up");

        // メール認証トークンを発行し、通知はfire-and-forget
        let raw_token = generate_secure_token(AUTH_TOKEN_LENGTH);
        self.auth_token_repo
            .issue(CreateAuthToken {
                user_id: user.id,
                token_hash: hash_token(&raw_token),
                purpose: TokenPurpose::EmailVerification,
                expires_at: Utc::now() + Duration::hours(24),
            })
            .await?;

        let email_service = self.email_service.clone();
        let to_email = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_email_verification(&to_email, &raw_token)
                .await
            {
                warn!(error = %e, "Failed to send verification email");
            }
        });

        let access_token = self
            .jwt_manager
            .generate_access_token(user.to_claims())
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            token_type: "Bearer".to_string(),
        })
    }

    pub async fn signin(&self, signin_data: SigninRequest) -> AppResult<AuthResponse> {
        signin_data
            .validate()
            .map_err(|e| convert_validation_errors(e, "auth_service::signin"))?;

        // ユーザー不在とパスワード不一致は同じメッセージで返す
        let user = self
            .user_repo
            .find_by_email(&signin_data.email)
            .await?
            .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

        let verified = self
            .password_manager
            .verify_password(&signin_data.password, &user.password_hash)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        if !verified {
            warn!(user_id = %user.id, "Sign-in with wrong password");
            return Err(AppError::Unauthorized(
                "Invalid email or password".to_string(),
            ));
        }

        if !user.is_active {
            return Err(AppError::Forbidden(
                "This account has been deactivated".to_string(),
            ));
        }

        self.user_repo.update_last_login(user.id).await?;

        let access_token = self
            .jwt_manager
            .generate_access_token(user.to_claims())
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        info!(user_id = %user.id, "User signed in");

        Ok(AuthResponse {
            user: user.into(),
            access_token,
            token_type: "Bearer".to_string(),
        })
    }

    // --- パスワードリセット ---

    /// パスワードリセット要求
    ///
    /// アカウントの存在を漏らさないため、ユーザーが見つからなくても
    /// 成功レスポンスを返す。
    pub async fn request_password_reset(
        &self,
        request: ForgotPasswordRequest,
    ) -> AppResult<MessageResponse> {
        request
            .validate()
            .map_err(|e| convert_validation_errors(e, "auth_service::request_password_reset"))?;

        const NEUTRAL_MESSAGE: &str =
            "If the email address exists, a password reset link has been sent";

        let user = self.user_repo.find_by_email(&request.email).await?;

        let Some(user) = user else {
            info!(email = %request.email, "Password reset requested for non-existent email");
            return Ok(MessageResponse {
                message: NEUTRAL_MESSAGE.to_string(),
            });
        };

        if !user.is_active {
            warn!(user_id = %user.id, "Password reset requested for inactive account");
            return Ok(MessageResponse {
                message: NEUTRAL_MESSAGE.to_string(),
            });
        }

        let raw_token = generate_secure_token(AUTH_TOKEN_LENGTH);
        let result = self
            .auth_token_repo
            .issue(CreateAuthToken {
                user_id: user.id,
                token_hash: hash_token(&raw_token),
                purpose: TokenPurpose::PasswordReset,
                expires_at: Utc::now() + Duration::hours(1),
            })
            .await?;

        info!(
            user_id = %user.id,
            token_id = %result.token_id,
            old_tokens_invalidated = %result.old_tokens_invalidated,
            "Password reset token created"
        );

        let email_service = self.email_service.clone();
        let to_email = user.email.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service.send_password_reset(&to_email, &raw_token).await {
                warn!(error = %e, "Failed to send password reset email");
            }
        });

        Ok(MessageResponse {
            message: NEUTRAL_MESSAGE.to_string(),
        })
    }

    /// パスワードリセット実行
    ///
    /// トークンの検証と消費は単一トランザクション。パスワード更新後の
    /// 残存トークン一括無効化が失敗しても、パスワード自体は変更済みなので
    /// ユーザーには成功を返し、不整合はログに残す。
    pub async fn reset_password(
        &self,
        reset_data: ResetPasswordRequest,
    ) -> AppResult<MessageResponse> {
        reset_data
            .validate()
            .map_err(|e| convert_validation_errors(e, "auth_service::reset_password"))?;

        // トークンを消費する前に強度チェック（弱いパスワードでトークンを
        // 無駄に消費させない）
        self.password_manager
            .validate_password_strength(&reset_data.new_password)
            .map_err(|e| AppError::ValidationError(e.to_string()))?;

        let consumed = self
            .auth_token_repo
            .consume(&hash_token(&reset_data.token), TokenPurpose::PasswordReset)
            .await?;

        let token = match consumed {
            Ok(token) => token,
            Err(TokenValidationError::NotFound) => {
                warn!("Password reset with invalid token");
                return Err(AppError::ValidationError(
                    "Invalid or expired reset token".to_string(),
                ));
            }
            Err(TokenValidationError::Expired) => {
                warn!("Password reset with expired token");
                return Err(AppError::ValidationError(
                    "Reset token has expired".to_string(),
                ));
            }
            Err(TokenValidationError::AlreadyConsumed) => {
                warn!("Password reset with already used token");
                return Err(AppError::ValidationError(
                    "Reset token has already been used".to_string(),
                ));
            }
        };

        let new_password_hash = self
            .password_manager
            .hash_password(&reset_data.new_password)
            .map_err(|e| {
                AppError::InternalServerError(format!("Password hashing failed: {}", e))
            })?;

        self.user_repo
            .update_password_hash(token.user_id, new_password_hash)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        // 手元に残った他のリセットトークンもすべて無効化する。ここでの失敗は
        // ユーザーへは成功として返し、運用フォローアップのためにログだけ残す
        match self
            .auth_token_repo
            .invalidate_user_tokens(token.user_id, TokenPurpose::PasswordReset)
            .await
        {
            Ok(invalidated) => {
                info!(
                    user_id = %token.user_id,
                    token_id = %token.id,
                    invalidated_tokens = %invalidated,
                    "Password reset completed successfully"
                );
            }
            Err(e) => {
                error!(
                    user_id = %token.user_id,
                    token_id = %token.id,
                    error = %e,
                    "Password was reset but outstanding reset tokens could not be invalidated"
                );
            }
        }

        Ok(MessageResponse {
            message: "Password has been reset successfully. Please log in with your new password"
                .to_string(),
        })
    }

    // --- メール認証 ---

    pub async fn verify_email(&self, request: VerifyEmailRequest) -> AppResult<MessageResponse> {
        request
            .validate()
            .map_err(|e| convert_validation_errors(e, "auth_service::verify_email"))?;

        let consumed = self
            .auth_token_repo
            .consume(&hash_token(&request.token), TokenPurpose::EmailVerification)
            .await?;

        let token = match consumed {
            Ok(token) => token,
            Err(TokenValidationError::Expired) => {
                return Err(AppError::ValidationError(
                    "Verification token has expired".to_string(),
                ));
            }
            Err(_) => {
                return Err(AppError::ValidationError(
                    "Invalid or expired verification token".to_string(),
                ));
            }
        };

        self.user_repo
            .mark_email_verified(token.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        info!(user_id = %token.user_id, "Email verified");

        Ok(MessageResponse {
            message: "Email address verified successfully".to_string(),
        })
    }
}
