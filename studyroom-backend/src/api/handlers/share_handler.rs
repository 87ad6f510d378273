// studyroom-backend/src/api/handlers/share_handler.rs

use crate::api::dto::share_dto::{
    CreateShareLinkRequest, CreateShareLinkResponse, ShareAccessResponse, ShareLinkDto,
    ShareLinkListResponse, SharedDocumentDto, TrackViewRequest, VerifySharePasswordRequest,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::{extract_client_ip, extract_user_agent, AuthenticatedUser};
use crate::middleware::rate_limit::RateLimitQuota;
use crate::service::share_link_service::CreateShareLinkInput;
use crate::types::ApiResponse;
use crate::utils::capability::capability_cookie_name;
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::time::Duration;
use uuid::Uuid;
use validator::Validate;

/// パスワード検証のレート制限（クライアントIPごと）
const VERIFY_PASSWORD_QUOTA: RateLimitQuota =
    RateLimitQuota::new(10, Duration::from_secs(15 * 60));

/// 共有リンク経由のドキュメント閲覧
///
/// ポリシー評価を通過した場合のみ署名付きURLを発行し、閲覧回数を
/// ちょうど1加算する。
pub async fn access_share(
    State(state): State<AppState>,
    Path(share_key): Path<String>,
    user: AuthenticatedUser,
    jar: CookieJar,
    headers: HeaderMap,
) -> AppResult<impl IntoResponse> {
    // パスワード検証済みケーパビリティはCookieの存在ではなく値を検証する
    let password_verified = jar
        .get(&capability_cookie_name(&share_key))
        .map(|cookie| state.capability_manager.verify(&share_key, cookie.value()))
        .unwrap_or(false);

    let grant = state
        .share_link_service
        .access_share(
            &share_key,
            &user,
            password_verified,
            extract_client_ip(&headers),
            extract_user_agent(&headers),
        )
        .await?;

    Ok(ApiResponse::success(ShareAccessResponse {
        document: SharedDocumentDto {
            id: grant.document.id,
            title: grant.document.title,
            file_name: grant.document.file_name,
        },
        signed_url: grant.signed_url,
        can_download: grant.can_download,
    }))
}

/// 共有リンクのパスワード検証
///
/// 成功時は共有キーから導出した名前のhttpOnly Cookieにケーパビリティ
/// トークンを載せる。有効期限は1時間固定。
pub async fn verify_share_password(
    State(state): State<AppState>,
    Path(share_key): Path<String>,
    jar: CookieJar,
    headers: HeaderMap,
    Json(request): Json<VerifySharePasswordRequest>,
) -> AppResult<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| convert_validation_errors(e, "share_handler::verify_share_password"))?;

    // ブルートフォース対策：IP単位で試行を絞る
    let ip = extract_client_ip(&headers).unwrap_or_else(|| "unknown".to_string());
    state
        .rate_limiter
        .ensure(&format!("share_password:{}", ip), VERIFY_PASSWORD_QUOTA)
        .await?;

    state
        .share_link_service
        .verify_share_password(&share_key, &request.password)
        .await?;

    let capability_token = state.capability_manager.issue(&share_key);
    let cookie = Cookie::build((capability_cookie_name(&share_key), capability_token))
        .http_only(state.cookie_config.http_only)
        .secure(state.cookie_config.secure)
        .same_site(SameSite::Lax)
        .path(state.cookie_config.path.clone())
        .max_age(time::Duration::hours(1))
        .build();

    Ok((
        jar.add(cookie),
        Json(serde_json::json!({ "success": true })),
    ))
}

/// 閲覧トラッキング
///
/// 分析が閲覧体験を阻害しないよう、内部エラーでも常に201を返す。
pub async fn track_share_view(
    State(state): State<AppState>,
    Path(share_key): Path<String>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> impl IntoResponse {
    // ボディは欠けていても壊れていても拒否しない
    let duration_secs = serde_json::from_slice::<TrackViewRequest>(&body)
        .ok()
        .and_then(|request| request.duration_secs);
    let ip_address = extract_client_ip(&headers);
    let user_agent = extract_user_agent(&headers);

    let analytics = state.analytics_service.clone();
    tokio::spawn(async move {
        analytics
            .track_share_view(&share_key, duration_secs, ip_address, user_agent)
            .await;
    });

    (
        StatusCode::CREATED,
        Json(serde_json::json!({ "success": true })),
    )
}

/// 共有リンクを作成
pub async fn create_share_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateShareLinkRequest>,
) -> AppResult<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| convert_validation_errors(e, "share_handler::create_share_link"))?;

    let share_link = state
        .share_link_service
        .create_share_link(
            &user,
            CreateShareLinkInput {
                document_id: request.document_id,
                password: request.password,
                expires_in_hours: request.expires_in_hours,
                max_views: request.max_views,
                restrict_to_email: request.restrict_to_email,
                can_download: request.can_download,
            },
        )
        .await?;

    let response = CreateShareLinkResponse {
        share_link: ShareLinkDto::from_model(share_link, &state.config.frontend_url),
        message: "Share link created successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// ドキュメントの共有リンク一覧
pub async fn list_share_links(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let share_links = state
        .share_link_service
        .list_share_links(&user, document_id)
        .await?;

    let share_links: Vec<ShareLinkDto> = share_links
        .into_iter()
        .map(|model| ShareLinkDto::from_model(model, &state.config.frontend_url))
        .collect();

    let total = share_links.len();
    Ok(ApiResponse::success(ShareLinkListResponse {
        share_links,
        total,
    }))
}

/// 共有リンクを取り消し
pub async fn revoke_share_link(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(share_link_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state
        .share_link_service
        .revoke_share_link(&user, share_link_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Share link revoked"
    })))
}
