// studyroom-backend/src/api/dto/studyroom_dto.rs

use crate::domain::bookshop_item_model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Bookshopアイテム作成リクエスト（管理者のみ）
#[derive(Deserialize, Debug, Validate)]
pub struct CreateBookshopItemRequest {
    pub document_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,

    #[validate(range(min = 0, message = "Price must not be negative"))]
    #[serde(default)]
    pub price_cents: i32,

    #[serde(default)]
    pub is_published: bool,
}

/// Bookshopアイテム情報
#[derive(Serialize, Debug)]
pub struct BookshopItemDto {
    pub id: Uuid,
    pub document_id: Uuid,
    pub title: String,
    pub price_cents: i32,
    pub is_free: bool,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
}

impl From<bookshop_item_model::Model> for BookshopItemDto {
    fn from(model: bookshop_item_model::Model) -> Self {
        let is_free = model.is_free();
        Self {
            id: model.id,
            document_id: model.document_id,
            title: model.title,
            price_cents: model.price_cents,
            is_free,
            is_published: model.is_published,
            created_at: model.created_at,
        }
    }
}

/// Bookshop一覧レスポンス
#[derive(Serialize, Debug)]
pub struct BookshopListResponse {
    pub items: Vec<BookshopItemDto>,
    pub total: usize,
}

/// StudyRoomアイテム追加リクエスト
#[derive(Deserialize, Debug)]
pub struct AddStudyRoomItemRequest {
    pub bookshop_item_id: Uuid,
}

/// StudyRoomアイテム情報
#[derive(Serialize, Debug)]
pub struct StudyRoomItemDto {
    pub id: Uuid,
    pub bookshop_item: Option<BookshopItemDto>,
    pub added_at: DateTime<Utc>,
}

/// StudyRoom一覧レスポンス
#[derive(Serialize, Debug)]
pub struct StudyRoomListResponse {
    pub items: Vec<StudyRoomItemDto>,
    pub total: usize,
}
