// studyroom-backend/src/repository/share_link_repository.rs

use crate::db::DbPool;
use crate::domain::share_link_model::{self, Entity as ShareLink};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, Condition, Set};
use uuid::Uuid;

pub struct ShareLinkRepository {
    db: DbPool,
}

/// 共有リンク作成用DTO
pub struct CreateShareLinkDto {
    pub document_id: Uuid,
    pub created_by: Uuid,
    pub share_key: String,
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub restrict_to_email: Option<String>,
    pub can_download: bool,
}

impl ShareLinkRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// 共有リンクを作成
    pub async fn create(&self, dto: CreateShareLinkDto) -> AppResult<share_link_model::Model> {
        let share_link = share_link_model::ActiveModel {
            document_id: Set(dto.document_id),
            created_by: Set(dto.created_by),
            share_key: Set(dto.share_key),
            password_hash: Set(dto.password_hash),
            expires_at: Set(dto.expires_at),
            max_views: Set(dto.max_views),
            restrict_to_email: Set(dto.restrict_to_email.map(|e| e.to_lowercase())),
            can_download: Set(dto.can_download),
            ..share_link_model::ActiveModel::new()
        };

        share_link.insert(&self.db).await.map_err(AppError::DbErr)
    }

    /// 共有キーで検索
    pub async fn find_by_share_key(
        &self,
        share_key: &str,
    ) -> AppResult<Option<share_link_model::Model>> {
        ShareLink::find()
            .filter(share_link_model::Column::ShareKey.eq(share_key))
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<share_link_model::Model>> {
        ShareLink::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// ドキュメントの有効な共有リンク一覧を取得
    pub async fn find_by_document_id(
        &self,
        document_id: Uuid,
    ) -> AppResult<Vec<share_link_model::Model>> {
        ShareLink::find()
            .filter(share_link_model::Column::DocumentId.eq(document_id))
            .filter(share_link_model::Column::IsActive.eq(true))
            .order_by_desc(share_link_model::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// 閲覧回数をアトミックにインクリメント
    ///
    /// read-modify-write ではなく単一の条件付きUPDATEで行う。max_views の
    /// ガードを増分と同じ文に含めることで、同時アクセスで上限を超えて
    /// 加算されることはない。上限に達していて増分できなかった場合は false。
    pub async fn try_increment_view_count(&self, id: Uuid) -> AppResult<bool> {
        let result = ShareLink::update_many()
            .col_expr(
                share_link_model::Column::ViewCount,
                Expr::col(share_link_model::Column::ViewCount).add(1),
            )
            .col_expr(
                share_link_model::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(share_link_model::Column::Id.eq(id))
            .filter(
                Condition::any()
                    .add(share_link_model::Column::MaxViews.is_null())
                    .add(
                        Expr::col(share_link_model::Column::ViewCount)
                            .lt(Expr::col(share_link_model::Column::MaxViews)),
                    ),
            )
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(result.rows_affected > 0)
    }

    /// 共有リンクを無効化（再有効化はできない）
    pub async fn revoke(&self, id: Uuid) -> AppResult<()> {
        let share_link = ShareLink::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)?
            .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;

        let mut active_model: share_link_model::ActiveModel = share_link.into();
        active_model.is_active = Set(false);

        active_model
            .update(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(())
    }
}
