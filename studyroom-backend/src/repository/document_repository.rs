// studyroom-backend/src/repository/document_repository.rs

use crate::db::DbPool;
use crate::domain::document_model::{self, Entity as Document};
use crate::error::{AppError, AppResult};
use sea_orm::{entity::*, query::*, Set};
use uuid::Uuid;

pub struct DocumentRepository {
    db: DbPool,
}

/// ドキュメント作成用DTO
pub struct CreateDocumentDto {
    pub user_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub storage_key: String,
    pub content_type: String,
    pub file_size: i64,
}

impl DocumentRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, dto: CreateDocumentDto) -> AppResult<document_model::Model> {
        let document = document_model::ActiveModel {
            user_id: Set(dto.user_id),
            title: Set(dto.title),
            file_name: Set(dto.file_name),
            storage_key: Set(dto.storage_key),
            content_type: Set(dto.content_type),
            file_size: Set(dto.file_size),
            ..document_model::ActiveModel::new()
        };

        document.insert(&self.db).await.map_err(AppError::DbErr)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<document_model::Model>> {
        Document::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    pub async fn find_by_user_id(&self, user_id: Uuid) -> AppResult<Vec<document_model::Model>> {
        Document::find()
            .filter(document_model::Column::UserId.eq(user_id))
            .order_by_desc(document_model::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// ドキュメントを削除（ページ・共有・分析レコードはFKカスケードで消える）
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = Document::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(result.rows_affected > 0)
    }
}
