// studyroom-backend/src/repository/user_repository.rs

use crate::db::DbPool;
use crate::domain::user_model::{self, Entity as User};
use crate::error::{AppError, AppResult};
use chrono::Utc;
use sea_orm::{entity::*, query::*, Set};
use uuid::Uuid;

pub struct UserRepository {
    db: DbPool,
}

/// ユーザー作成用DTO
pub struct CreateUserDto {
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

impl UserRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    pub async fn create(&self, dto: CreateUserDto) -> AppResult<user_model::Model> {
        let user = user_model::ActiveModel {
            email: Set(dto.email.to_lowercase()),
            password_hash: Set(dto.password_hash),
            role: Set(dto.role),
            ..user_model::ActiveModel::new()
        };

        user.insert(&self.db).await.map_err(AppError::DbErr)
    }

    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<user_model::Model>> {
        User::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    pub async fn find_by_ids(&self, ids: Vec<Uuid>) -> AppResult<Vec<user_model::Model>> {
        if ids.is_empty() {
            return Ok(vec![]);
        }

        User::find()
            .filter(user_model::Column::Id.is_in(ids))
            .all(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    /// メールアドレスで検索（大文字小文字は区別しない）
    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<user_model::Model>> {
        User::find()
            .filter(user_model::Column::Email.eq(email.to_lowercase()))
            .one(&self.db)
            .await
            .map_err(AppError::DbErr)
    }

    pub async fn update_password_hash(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> AppResult<Option<user_model::Model>> {
        let Some(user) = self.find_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active_model: user_model::ActiveModel = user.into();
        active_model.password_hash = Set(password_hash);

        active_model
            .update(&self.db)
            .await
            .map(Some)
            .map_err(AppError::DbErr)
    }

    pub async fn update_last_login(&self, user_id: Uuid) -> AppResult<()> {
        let Some(user) = self.find_by_id(user_id).await? else {
            return Ok(());
        };

        let mut active_model: user_model::ActiveModel = user.into();
        active_model.last_login_at = Set(Some(Utc::now()));

        active_model.update(&self.db).await.map_err(AppError::DbErr)?;
        Ok(())
    }

    pub async fn mark_email_verified(&self, user_id: Uuid) -> AppResult<Option<user_model::Model>> {
        let Some(user) = self.find_by_id(user_id).await? else {
            return Ok(None);
        };

        let mut active_model: user_model::ActiveModel = user.into();
        active_model.email_verified = Set(true);

        active_model
            .update(&self.db)
            .await
            .map(Some)
            .map_err(AppError::DbErr)
    }

    /// 無料ドキュメント数カウンタをアトミックに増減
    pub async fn adjust_free_document_count(&self, user_id: Uuid, delta: i32) -> AppResult<()> {
        use sea_orm::sea_query::Expr;

        User::update_many()
            .col_expr(
                user_model::Column::FreeDocumentCount,
                Expr::col(user_model::Column::FreeDocumentCount).add(delta),
            )
            .col_expr(
                user_model::Column::UpdatedAt,
                Expr::value(Utc::now()),
            )
            .filter(user_model::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(())
    }
}
