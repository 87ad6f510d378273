// studyroom-backend/src/repository/document_page_repository.rs

use crate::db::DbPool;
use crate::domain::document_page_model::{self, Entity as DocumentPage};
use crate::error::{AppError, AppResult};
use sea_orm::{entity::*, query::*};
use uuid::Uuid;

pub struct DocumentPageRepository {
    db: DbPool,
}

impl DocumentPageRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// ドキュメントのページ一覧をページ番号順で取得
    pub async fn find_by_document_id(
        &self,
        document_id: Uuid,
    ) -> AppResult<Vec<document_page_model::Model>> {
        DocumentPage::find()
            .filter(document_page_model::Column::DocumentId.eq(document_id))
            .order_by_asc(document_page_model::Column::PageNumber)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }
}
