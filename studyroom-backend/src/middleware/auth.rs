// studyroom-backend/src/middleware/auth.rs

use crate::domain::role::RoleName;
use crate::domain::user_model::UserClaims;
use crate::error::AppError;
use crate::utils::jwt::JwtManager;
use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::warn;

/// アクセストークンを格納するCookie名
pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// 認証済みユーザー情報を格納するエクステンション
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub claims: UserClaims,
}

impl AuthenticatedUser {
    pub fn new(claims: UserClaims) -> Self {
        Self { claims }
    }

    pub fn user_id(&self) -> uuid::Uuid {
        self.claims.user_id
    }

    pub fn email(&self) -> &str {
        &self.claims.email
    }

    /// 管理者かチェック
    pub fn is_admin(&self) -> bool {
        self.claims.is_admin()
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.claims.has_role(role)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))
    }
}

impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

/// JWT認証ミドルウェア
///
/// Cookie または Authorization: Bearer からアクセストークンを取り出して
/// 検証し、検証済みクレームをリクエストエクステンションに積む。
pub async fn jwt_auth_middleware(
    State(jwt_manager): State<Arc<JwtManager>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = extract_access_token(&jar, request.headers())
        .ok_or_else(|| AppError::Unauthorized("Authentication required".to_string()))?;

    let claims = jwt_manager.verify_access_token(&token).map_err(|e| {
        warn!(error = %e, "Access token verification failed");
        AppError::Unauthorized("Invalid or expired access token".to_string())
    })?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser::new(claims.user));

    Ok(next.run(request).await)
}

/// Cookie優先・Bearerフォールバックでアクセストークンを取り出す
fn extract_access_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// クライアントIPをヘッダーから取り出す
///
/// リバースプロキシ配下を想定し X-Forwarded-For の先頭を優先する。
pub fn extract_client_ip(headers: &HeaderMap) -> Option<String> {
    if let Some(forwarded) = headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
    {
        if let Some(first) = forwarded.split(',').next() {
            let trimmed = first.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }

    headers
        .get("x-real-ip")
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_string())
}

/// User-Agentヘッダーを取り出す
pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_extract_client_ip_prefers_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(extract_client_ip(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn test_extract_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));

        assert_eq!(extract_client_ip(&headers), Some("10.0.0.2".to_string()));
        assert_eq!(extract_client_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_extract_access_token_from_bearer() {
        let jar = CookieJar::from_headers(&HeaderMap::new());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer some.jwt.token"),
        );

        assert_eq!(
            extract_access_token(&jar, &headers),
            Some("some.jwt.token".to_string())
        );
        assert_eq!(extract_access_token(&jar, &HeaderMap::new()), None);
    }
}
