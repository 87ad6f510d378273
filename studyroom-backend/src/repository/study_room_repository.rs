// studyroom-backend/src/repository/study_room_repository.rs

use crate::db::DbPool;
use crate::domain::bookshop_item_model::{self, Entity as BookshopItem};
use crate::domain::study_room_item_model::{self, Entity as StudyRoomItem};
use crate::error::{AppError, AppResult};
use sea_orm::{entity::*, query::*, PaginatorTrait, Set};
use uuid::Uuid;

pub struct StudyRoomRepository {
    db: DbPool,
}

/// Bookshopアイテム作成用DTO
pub struct CreateBookshopItemDto {
    pub document_id: Uuid,
    pub title: String,
    pub price_cents: i32,
    pub is_published: bool,
    pub created_by: Uuid,
}

impl StudyRoomRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    // --- Bookshop ---

    pub async fn create_bookshop_item(
        &self,
        dto: CreateBookshopItemDto,
    ) -> AppResult<bookshop_item_model::Model> {
        let item = bookshop_item_model::ActiveModel {
            document_id: Set(dto.document_id),
            title: Set(dto.title),
            price_cents: Set(dto.price_cents),
            is_published: Set(dto.is_published),
            created_by: Set(dto.created_by),
            ..bookshop_item_model::ActiveModel::new()
        };

        item.insert(&self.db).await.map_err(AppError::DbErr)
    }

    pub async fn find_bookshop_item_by_id(
        &self,
        id: Uuid,
    ) -> AppResult<Option<bookshop_item_model::Model>> {
        BookshopItem::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// 公開中のBookshopアイテム一覧を取得
    pub async fn find_published_items(&self) -> AppResult<Vec<bookshop_item_model::Model>> {
        BookshopItem::find()
            .filter(bookshop_item_model::Column::IsPublished.eq(true))
            .order_by_desc(bookshop_item_model::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    // --- StudyRoom ---

    pub async fn add_study_room_item(
        &self,
        user_id: Uuid,
        bookshop_item_id: Uuid,
    ) -> AppResult<study_room_item_model::Model> {
        let item = study_room_item_model::ActiveModel {
            user_id: Set(user_id),
            bookshop_item_id: Set(bookshop_item_id),
            ..study_room_item_model::ActiveModel::new()
        };

        item.insert(&self.db).await.map_err(AppError::DbErr)
    }

    pub async fn find_study_room_item_by_id(
        &self,
        id: Uuid,
    ) -> AppResult<Option<study_room_item_model::Model>> {
        StudyRoomItem::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    pub async fn find_study_room_item(
        &self,
        user_id: Uuid,
        bookshop_item_id: Uuid,
    ) -> AppResult<Option<study_room_item_model::Model>> {
        StudyRoomItem::find()
            .filter(study_room_item_model::Column::UserId.eq(user_id))
            .filter(study_room_item_model::Column::BookshopItemId.eq(bookshop_item_id))
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// ユーザーのStudyRoomアイテムをBookshopアイテムと結合して取得
    pub async fn find_study_room_items_by_user(
        &self,
        user_id: Uuid,
    ) -> AppResult<
        Vec<(
            study_room_item_model::Model,
            Option<bookshop_item_model::Model>,
        )>,
    > {
        StudyRoomItem::find()
            .filter(study_room_item_model::Column::UserId.eq(user_id))
            .order_by_desc(study_room_item_model::Column::CreatedAt)
            .find_also_related(bookshop_item_model::Entity)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// メンバーのStudyRoom経由でドキュメントに到達できるか
    ///
    /// 公開中のBookshopアイテムがこのドキュメントをラップしており、かつ
    /// そのアイテムがメンバーのStudyRoomに追加されている場合のみ true。
    pub async fn member_has_document(&self, user_id: Uuid, document_id: Uuid) -> AppResult<bool> {
        let count = StudyRoomItem::find()
            .filter(study_room_item_model::Column::UserId.eq(user_id))
            .inner_join(bookshop_item_model::Entity)
            .filter(bookshop_item_model::Column::DocumentId.eq(document_id))
            .filter(bookshop_item_model::Column::IsPublished.eq(true))
            .count(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(count > 0)
    }
}
