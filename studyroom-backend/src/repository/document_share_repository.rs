// studyroom-backend/src/repository/document_share_repository.rs

use crate::db::DbPool;
use crate::domain::document_model;
use crate::domain::document_share_model::{self, Entity as DocumentShare};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::{entity::*, query::*, Condition, PaginatorTrait, QuerySelect, Set};
use uuid::Uuid;

pub struct DocumentShareRepository {
    db: DbPool,
}

/// メール共有作成用DTO
pub struct CreateDocumentShareDto {
    pub document_id: Uuid,
    pub shared_by_user_id: Uuid,
    pub shared_with_user_id: Option<Uuid>,
    pub shared_with_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub can_download: bool,
    pub note: Option<String>,
}

impl DocumentShareRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        dto: CreateDocumentShareDto,
    ) -> AppResult<document_share_model::Model> {
        let share = document_share_model::ActiveModel {
            document_id: Set(dto.document_id),
            shared_by_user_id: Set(dto.shared_by_user_id),
            shared_with_user_id: Set(dto.shared_with_user_id),
            shared_with_email: Set(dto.shared_with_email.map(|e| e.to_lowercase())),
            expires_at: Set(dto.expires_at),
            can_download: Set(dto.can_download),
            note: Set(dto.note),
            ..document_share_model::ActiveModel::new()
        };

        share.insert(&self.db).await.map_err(AppError::DbErr)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<document_share_model::Model>> {
        DocumentShare::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// 同じ（ドキュメント・共有者・受信者）組み合わせの有効な共有を検索
    ///
    /// 受信者は登録ユーザーIDまたはメールアドレスのどちらの形でも照合する。
    pub async fn find_active_duplicate(
        &self,
        document_id: Uuid,
        shared_by_user_id: Uuid,
        recipient_user_id: Option<Uuid>,
        recipient_email: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<document_share_model::Model>> {
        let mut recipient_condition = Condition::any()
            .add(document_share_model::Column::SharedWithEmail.eq(recipient_email.to_lowercase()));
        if let Some(user_id) = recipient_user_id {
            recipient_condition =
                recipient_condition.add(document_share_model::Column::SharedWithUserId.eq(user_id));
        }

        DocumentShare::find()
            .filter(document_share_model::Column::DocumentId.eq(document_id))
            .filter(document_share_model::Column::SharedByUserId.eq(shared_by_user_id))
            .filter(recipient_condition)
            .filter(
                Condition::any()
                    .add(document_share_model::Column::ExpiresAt.is_null())
                    .add(document_share_model::Column::ExpiresAt.gt(now)),
            )
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// 共有を取り消し（行削除）
    pub async fn delete(&self, id: Uuid) -> AppResult<bool> {
        let result = DocumentShare::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(result.rows_affected > 0)
    }

    /// 受信トレイの1ページ分を取得（共有先ドキュメントを結合）
    ///
    /// ユーザーID・メールアドレスのどちらで共有されたものも対象。期限切れは
    /// SQL側で除外し、新しい順に並べる。戻り値は（行, 総件数）。
    pub async fn find_inbox_page(
        &self,
        user_id: Uuid,
        email: &str,
        offset: u64,
        limit: u64,
        now: DateTime<Utc>,
    ) -> AppResult<(
        Vec<(document_share_model::Model, Option<document_model::Model>)>,
        u64,
    )> {
        let recipient_condition = Condition::any()
            .add(document_share_model::Column::SharedWithUserId.eq(user_id))
            .add(document_share_model::Column::SharedWithEmail.eq(email.to_lowercase()));

        let not_expired_condition = Condition::any()
            .add(document_share_model::Column::ExpiresAt.is_null())
            .add(document_share_model::Column::ExpiresAt.gt(now));

        let total = DocumentShare::find()
            .filter(recipient_condition.clone())
            .filter(not_expired_condition.clone())
            .count(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        let items = DocumentShare::find()
            .filter(recipient_condition)
            .filter(not_expired_condition)
            .order_by_desc(document_share_model::Column::CreatedAt)
            .offset(offset)
            .limit(limit)
            .find_also_related(document_model::Entity)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok((items, total))
    }
}
