// studyroom-backend/src/api/handlers/inbox_handler.rs

use crate::api::dto::inbox_dto::{
    CreateEmailShareRequest, CreateEmailShareResponse, EmailShareDto, InboxItemDto,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::document_share_service::CreateEmailShareInput;
use crate::types::{ApiResponse, PaginatedResponse, PaginationQuery};
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

/// メール共有を作成
pub async fn create_email_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateEmailShareRequest>,
) -> AppResult<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| convert_validation_errors(e, "inbox_handler::create_email_share"))?;

    let share = state
        .document_share_service
        .create_email_share(
            &user,
            CreateEmailShareInput {
                document_id: request.document_id,
                recipient_email: request.email,
                expires_at: request.expires_at,
                can_download: request.can_download,
                note: request.note,
            },
        )
        .await?;

    let response = CreateEmailShareResponse {
        share: EmailShareDto::from(share),
        message: "Document shared successfully".to_string(),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// メール共有を取り消し
pub async fn revoke_email_share(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(share_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state
        .document_share_service
        .revoke_email_share(&user, share_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Share revoked"
    })))
}

/// 受信トレイを取得
///
/// page / limit（デフォルト50・最大100）でページネーションし、期限切れは
/// 除外済み・新しい順で返す。
pub async fn get_inbox(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<PaginationQuery>,
) -> AppResult<impl IntoResponse> {
    let (page, limit) = query.get_pagination();

    let inbox = state
        .document_share_service
        .get_inbox(&user, page, limit)
        .await?;

    let items: Vec<InboxItemDto> = inbox.entries.into_iter().map(InboxItemDto::from).collect();

    Ok(ApiResponse::success(PaginatedResponse::new(
        items,
        page,
        limit,
        inbox.total as i64,
    )))
}
