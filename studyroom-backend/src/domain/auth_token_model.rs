// studyroom-backend/src/domain/auth_token_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

/// 単回使用の認証トークン（パスワードリセット・メール認証）
///
/// 状態遷移は ISSUED → CONSUMED の一方向のみ。消費はリポジトリ層の
/// 単一トランザクションで行い、検証と無効化の間に隙間を作らない。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    pub user_id: Uuid,

    #[serde(skip_serializing)] // トークンハッシュは絶対にシリアライズしない
    pub token_hash: String,

    pub purpose: String,

    pub expires_at: DateTime<Utc>,

    pub is_consumed: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::UserId",
        to = "crate::domain::user_model::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<crate::domain::user_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            is_consumed: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

/// トークンの用途
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenPurpose {
    PasswordReset,
    EmailVerification,
}

impl TokenPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenPurpose::PasswordReset => "password_reset",
            TokenPurpose::EmailVerification => "email_verification",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "password_reset" => Some(TokenPurpose::PasswordReset),
            "email_verification" => Some(TokenPurpose::EmailVerification),
            _ => None,
        }
    }
}

impl Model {
    /// トークンが期限切れかどうかをチェック
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// トークンが消費可能な状態かチェック（詳細な理由付き）
    pub fn can_be_consumed(&self, now: DateTime<Utc>) -> Result<(), TokenValidationError> {
        if self.is_consumed {
            return Err(TokenValidationError::AlreadyConsumed);
        }

        if self.is_expired(now) {
            return Err(TokenValidationError::Expired);
        }

        Ok(())
    }
}

/// トークン検証エラーの種類
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenValidationError {
    /// トークンが既に消費済み
    AlreadyConsumed,
    /// トークンが期限切れ
    Expired,
    /// トークンが見つからない（用途違いも一致なし扱い）
    NotFound,
}

impl std::fmt::Display for TokenValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenValidationError::AlreadyConsumed => write!(f, "Token has already been used"),
            TokenValidationError::Expired => write!(f, "Token has expired"),
            TokenValidationError::NotFound => write!(f, "Token not found"),
        }
    }
}

impl std::error::Error for TokenValidationError {}

/// 認証トークンの作成用構造体
#[derive(Debug, Clone)]
pub struct CreateAuthToken {
    pub user_id: Uuid,
    pub token_hash: String,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
}

impl From<CreateAuthToken> for ActiveModel {
    fn from(create_token: CreateAuthToken) -> Self {
        Self {
            user_id: Set(create_token.user_id),
            token_hash: Set(create_token.token_hash),
            purpose: Set(create_token.purpose.as_str().to_string()),
            expires_at: Set(create_token.expires_at),
            ..Self::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_token(now: DateTime<Utc>) -> Model {
        Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            token_hash: "hash".to_string(),
            purpose: TokenPurpose::PasswordReset.as_str().to_string(),
            expires_at: now + Duration::hours(1),
            is_consumed: false,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_fresh_token_can_be_consumed() {
        let now = Utc::now();
        assert!(base_token(now).can_be_consumed(now).is_ok());
    }

    #[test]
    fn test_consumed_token_is_rejected_before_expiry_check() {
        let now = Utc::now();
        let token = Model {
            is_consumed: true,
            expires_at: now - Duration::hours(1),
            ..base_token(now)
        };

        // 消費済みかつ期限切れなら AlreadyConsumed を先に報告
        assert_eq!(
            token.can_be_consumed(now),
            Err(TokenValidationError::AlreadyConsumed)
        );
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let now = Utc::now();
        let token = Model {
            expires_at: now - Duration::seconds(1),
            ..base_token(now)
        };

        assert_eq!(token.can_be_consumed(now), Err(TokenValidationError::Expired));
    }

    #[test]
    fn test_purpose_roundtrip() {
        for purpose in [TokenPurpose::PasswordReset, TokenPurpose::EmailVerification] {
            assert_eq!(TokenPurpose::from_str(purpose.as_str()), Some(purpose));
        }
        assert_eq!(TokenPurpose::from_str("refresh"), None);
    }
}
