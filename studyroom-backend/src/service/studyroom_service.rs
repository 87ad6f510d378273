// studyroom-backend/src/service/studyroom_service.rs

use crate::db::DbPool;
use crate::domain::bookshop_item_model;
use crate::domain::study_room_item_model;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::repository::document_repository::DocumentRepository;
use crate::repository::study_room_repository::{CreateBookshopItemDto, StudyRoomRepository};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

pub struct StudyRoomService {
    study_room_repo: Arc<StudyRoomRepository>,
    document_repo: Arc<DocumentRepository>,
}

/// Bookshopアイテム作成の入力
#[derive(Debug, Clone)]
pub struct CreateBookshopItemInput {
    pub document_id: Uuid,
    pub title: String,
    pub price_cents: i32,
    pub is_published: bool,
}

impl StudyRoomService {
    pub fn new(db_pool: DbPool) -> Self {
        Self {
            study_room_repo: Arc::new(StudyRoomRepository::new(db_pool.clone())),
            document_repo: Arc::new(DocumentRepository::new(db_pool)),
        }
    }

    /// Bookshopアイテムを出品（管理者のみ）
    pub async fn create_bookshop_item(
        &self,
        user: &AuthenticatedUser,
        input: CreateBookshopItemInput,
    ) -> AppResult<bookshop_item_model::Model> {
        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "Only administrators can publish bookshop items".to_string(),
            ));
        }

        self.document_repo
            .find_by_id(input.document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        let item = self
            .study_room_repo
            .create_bookshop_item(CreateBookshopItemDto {
                document_id: input.document_id,
                title: input.title,
                price_cents: input.price_cents,
                is_published: input.is_published,
                created_by: user.user_id(),
            })
            .await?;

        info!(
            user_id = %user.user_id(),
            bookshop_item_id = %item.id,
            "Bookshop item created"
        );

        Ok(item)
    }

    /// 公開中のBookshopアイテム一覧
    pub async fn list_published_items(&self) -> AppResult<Vec<bookshop_item_model::Model>> {
        self.study_room_repo.find_published_items().await
    }

    /// BookshopアイテムをStudyRoomに追加
    ///
    /// 公開中のアイテムのみ追加可能。同じアイテムの二重追加は拒否。
    pub async fn add_study_room_item(
        &self,
        user: &AuthenticatedUser,
        bookshop_item_id: Uuid,
    ) -> AppResult<study_room_item_model::Model> {
        let bookshop_item = self
            .study_room_repo
            .find_bookshop_item_by_id(bookshop_item_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Bookshop item not found".to_string()))?;

        if !bookshop_item.is_published {
            return Err(AppError::NotFound("Bookshop item not found".to_string()));
        }

        if self
            .study_room_repo
            .find_study_room_item(user.user_id(), bookshop_item_id)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict(
                "This item is already in your study room".to_string(),
            ));
        }

        let item = self
            .study_room_repo
            .add_study_room_item(user.user_id(), bookshop_item_id)
            .await?;

        info!(
            user_id = %user.user_id(),
            bookshop_item_id = %bookshop_item_id,
            "Study room item added"
        );

        Ok(item)
    }

    /// StudyRoomの一覧（Bookshopアイテム解決済み）
    pub async fn list_study_room_items(
        &self,
        user_id: Uuid,
    ) -> AppResult<
        Vec<(
            study_room_item_model::Model,
            Option<bookshop_item_model::Model>,
        )>,
    > {
        self.study_room_repo
            .find_study_room_items_by_user(user_id)
            .await
    }
}
