// studyroom-backend/src/api/handlers/studyroom_handler.rs

use crate::api::dto::studyroom_dto::{
    AddStudyRoomItemRequest, BookshopItemDto, BookshopListResponse, CreateBookshopItemRequest,
    StudyRoomItemDto, StudyRoomListResponse,
};
use crate::api::AppState;
use crate::error::AppResult;
use crate::middleware::auth::AuthenticatedUser;
use crate::service::studyroom_service::CreateBookshopItemInput;
use crate::types::ApiResponse;
use crate::utils::error_helper::convert_validation_errors;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

/// Bookshopアイテムを出品（管理者のみ）
pub async fn create_bookshop_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<CreateBookshopItemRequest>,
) -> AppResult<impl IntoResponse> {
    request
        .validate()
        .map_err(|e| convert_validation_errors(e, "studyroom_handler::create_bookshop_item"))?;

    let item = state
        .studyroom_service
        .create_bookshop_item(
            &user,
            CreateBookshopItemInput {
                document_id: request.document_id,
                title: request.title,
                price_cents: request.price_cents,
                is_published: request.is_published,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(BookshopItemDto::from(item))))
}

/// 公開中のBookshopアイテム一覧
pub async fn list_bookshop_items(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let items = state.studyroom_service.list_published_items().await?;

    let items: Vec<BookshopItemDto> = items.into_iter().map(BookshopItemDto::from).collect();
    let total = items.len();

    Ok(ApiResponse::success(BookshopListResponse { items, total }))
}

/// BookshopアイテムをStudyRoomに追加
pub async fn add_study_room_item(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(request): Json<AddStudyRoomItemRequest>,
) -> AppResult<impl IntoResponse> {
    let item = state
        .studyroom_service
        .add_study_room_item(&user, request.bookshop_item_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "study_room_item_id": item.id
        })),
    ))
}

/// StudyRoomの一覧
pub async fn list_study_room_items(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let rows = state
        .studyroom_service
        .list_study_room_items(user.user_id())
        .await?;

    let items: Vec<StudyRoomItemDto> = rows
        .into_iter()
        .map(|(item, bookshop_item)| StudyRoomItemDto {
            id: item.id,
            bookshop_item: bookshop_item.map(BookshopItemDto::from),
            added_at: item.created_at,
        })
        .collect();

    let total = items.len();
    Ok(ApiResponse::success(StudyRoomListResponse { items, total }))
}
