// studyroom-backend/src/repository/auth_token_repository.rs

use crate::db::DbPool;
use crate::domain::auth_token_model::{
    self, CreateAuthToken, Entity as AuthToken, TokenPurpose, TokenValidationError,
};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{entity::*, query::*, QuerySelect, Set, TransactionTrait};
use uuid::Uuid;

pub struct AuthTokenRepository {
    db: DbPool,
}

/// トークン発行結果
pub struct IssueTokenResult {
    pub token_id: Uuid,
    pub old_tokens_invalidated: u64,
}

impl AuthTokenRepository {
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// 新しいトークンを発行し、同一用途の未消費トークンを同時に無効化
    ///
    /// 古いトークンの無効化と新規発行を1トランザクションで行い、常に
    /// 最新の1本だけが有効な状態を保つ。
    pub async fn issue(&self, create_token: CreateAuthToken) -> AppResult<IssueTokenResult> {
        let txn = self.db.begin().await.map_err(AppError::DbErr)?;

        let invalidated = AuthToken::update_many()
            .col_expr(auth_token_model::Column::IsConsumed, Expr::value(true))
            .col_expr(auth_token_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(auth_token_model::Column::UserId.eq(create_token.user_id))
            .filter(auth_token_model::Column::Purpose.eq(create_token.purpose.as_str()))
            .filter(auth_token_model::Column::IsConsumed.eq(false))
            .exec(&txn)
            .await
            .map_err(AppError::DbErr)?;

        let active_model: auth_token_model::ActiveModel = create_token.into();
        let token = active_model.insert(&txn).await.map_err(AppError::DbErr)?;

        txn.commit().await.map_err(AppError::DbErr)?;

        Ok(IssueTokenResult {
            token_id: token.id,
            old_tokens_invalidated: invalidated.rows_affected,
        })
    }

    /// トークンを消費する（ISSUED → CONSUMED の単一アトミック遷移）
    ///
    /// ハッシュ値と用途の両方で照合する。用途違いは NotFound（別用途への
    /// リプレイを防ぐ）。検証と消費マークを1トランザクションにまとめて
    /// いるため、同じトークンが二度成功することはない。
    pub async fn consume(
        &self,
        token_hash: &str,
        purpose: TokenPurpose,
    ) -> AppResult<Result<auth_token_model::Model, TokenValidationError>> {
        let txn = self.db.begin().await.map_err(AppError::DbErr)?;

        let Some(token) = AuthToken::find()
            .filter(auth_token_model::Column::TokenHash.eq(token_hash))
            .filter(auth_token_model::Column::Purpose.eq(purpose.as_str()))
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(AppError::DbErr)?
        else {
            txn.rollback().await.map_err(AppError::DbErr)?;
            return Ok(Err(TokenValidationError::NotFound));
        };

        if let Err(validation_error) = token.can_be_consumed(Utc::now()) {
            txn.rollback().await.map_err(AppError::DbErr)?;
            return Ok(Err(validation_error));
        }

        let mut active_model: auth_token_model::ActiveModel = token.into();
        active_model.is_consumed = Set(true);
        let consumed = active_model.update(&txn).await.map_err(AppError::DbErr)?;

        txn.commit().await.map_err(AppError::DbErr)?;

        Ok(Ok(consumed))
    }

    /// ユーザーの同一用途トークンをすべて無効化
    ///
    /// パスワード更新後に呼び出し、手元に残った古いリセットトークンでの
    /// 再リセットを防ぐ。
    pub async fn invalidate_user_tokens(
        &self,
        user_id: Uuid,
        purpose: TokenPurpose,
    ) -> AppResult<u64> {
        let result = AuthToken::update_many()
            .col_expr(auth_token_model::Column::IsConsumed, Expr::value(true))
            .col_expr(auth_token_model::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(auth_token_model::Column::UserId.eq(user_id))
            .filter(auth_token_model::Column::Purpose.eq(purpose.as_str()))
            .filter(auth_token_model::Column::IsConsumed.eq(false))
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(result.rows_affected)
    }

    /// 期限切れトークンを物理削除（定期クリーンアップ用）
    pub async fn delete_expired(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = AuthToken::delete_many()
            .filter(auth_token_model::Column::ExpiresAt.lt(before))
            .exec(&self.db)
            .await
            .map_err(AppError::DbErr)?;

        Ok(result.rows_affected)
    }
}
