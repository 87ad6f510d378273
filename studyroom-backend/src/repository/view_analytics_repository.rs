// studyroom-backend/src/repository/view_analytics_repository.rs

use crate::db::DbPool;
use crate::domain::view_analytics_model::{self, Entity as ViewAnalytics};
use crate::error::{AppError, AppResult};
use sea_orm::{entity::*, query::*, QuerySelect, Set};
use uuid::Uuid;

pub struct ViewAnalyticsRepository {
    db: DbPool,
}

/// 閲覧イベント記録用DTO
pub struct RecordViewDto {
    pub document_id: Uuid,
    pub share_key: Option<String>,
    pub viewer_email: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub duration_secs: Option<i32>,
}

impl ViewAnalyticsRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// 閲覧イベントを追記（更新・削除のAPIは提供しない）
    pub async fn record(&self, dto: RecordViewDto) -> AppResult<view_analytics_model::Model> {
        let event = view_analytics_model::ActiveModel {
            document_id: Set(dto.document_id),
            share_key: Set(dto.share_key),
            viewer_email: Set(dto.viewer_email),
            ip_address: Set(dto.ip_address),
            user_agent: Set(dto.user_agent),
            country: Set(dto.country),
            city: Set(dto.city),
            duration_secs: Set(dto.duration_secs),
            ..view_analytics_model::ActiveModel::new()
        };

        event.insert(&self.db).await.map_err(AppError::DbErr)
    }

    /// ドキュメントの閲覧イベントを新しい順に取得
    pub async fn find_by_document_id(
        &self,
        document_id: Uuid,
        limit: u64,
    ) -> AppResult<Vec<view_analytics_model::Model>> {
        ViewAnalytics::find()
            .filter(view_analytics_model::Column::DocumentId.eq(document_id))
            .order_by_desc(view_analytics_model::Column::ViewedAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }
}
