// studyroom-backend/src/api/handlers/auth_handler.rs

use crate::api::dto::auth_dto::{
    ForgotPasswordRequest, ResetPasswordRequest, SigninRequest, SignupRequest, VerifyEmailRequest,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::{extract_client_ip, ACCESS_TOKEN_COOKIE};
use crate::middleware::rate_limit::RateLimitQuota;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;

/// パスワードリセット要求のレート制限（メールアドレスごと）
const FORGOT_PASSWORD_QUOTA: RateLimitQuota = RateLimitQuota::new(3, Duration::from_secs(3600));
/// パスワードリセット実行のレート制限（クライアントIPごと）
const RESET_PASSWORD_QUOTA: RateLimitQuota = RateLimitQuota::new(5, Duration::from_secs(3600));

/// サインアップ
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let response = state.auth_service.signup(request).await?;
    let jar = jar.add(build_access_token_cookie(&state, &response.access_token));

    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// サインイン
pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(request): Json<SigninRequest>,
) -> AppResult<impl IntoResponse> {
    let response = state.auth_service.signin(request).await?;
    let jar = jar.add(build_access_token_cookie(&state, &response.access_token));

    Ok((jar, Json(response)))
}

/// メール認証
pub async fn verify_email(
    State(state): State<AppState>,
    Json(request): Json<VerifyEmailRequest>,
) -> AppResult<impl IntoResponse> {
    let response = state.auth_service.verify_email(request).await?;
    Ok(Json(response))
}

/// パスワードリセット要求
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    state
        .rate_limiter
        .ensure(
            &format!("forgot_password:{}", request.email.to_lowercase()),
            FORGOT_PASSWORD_QUOTA,
        )
        .await?;

    let response = state.auth_service.request_password_reset(request).await?;
    Ok(Json(response))
}

/// パスワードリセット実行
pub async fn reset_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    let ip = extract_client_ip(&headers).unwrap_or_else(|| "unknown".to_string());
    state
        .rate_limiter
        .ensure(&format!("reset_password:{}", ip), RESET_PASSWORD_QUOTA)
        .await?;

    let response = state.auth_service.reset_password(request).await?;
    Ok(Json(response))
}

/// アクセストークンCookieを構築
fn build_access_token_cookie(state: &AppState, access_token: &str) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, access_token.to_string()))
        .http_only(state.cookie_config.http_only)
        .secure(state.cookie_config.secure)
        .same_site(SameSite::Lax)
        .path(state.cookie_config.path.clone())
        .max_age(time::Duration::minutes(
            state.jwt_manager.access_token_expiry_minutes(),
        ))
        .build()
}
