// studyroom-backend/src/domain/share_link_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "share_links")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_id: Uuid,
    pub created_by: Uuid,
    #[sea_orm(unique)]
    pub share_key: String,
    #[serde(skip_serializing)] // パスワードハッシュは絶対にシリアライズしない
    pub password_hash: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub restrict_to_email: Option<String>,
    pub can_download: bool,
    pub is_active: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::document_model::Entity",
        from = "Column::DocumentId",
        to = "crate::domain::document_model::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Document,

    #[sea_orm(
        belongs_to = "crate::domain::user_model::Entity",
        from = "Column::CreatedBy",
        to = "crate::domain::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<crate::domain::document_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
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
            can_download: Set(false),
            is_active: Set(true),
            view_count: Set(0),
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

/// 共有リンクへのアクセス可否の判定結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareAccessDecision {
    /// アクセス許可
    Allowed,
    /// パスワード入力が必要（拒否理由を開示しない）
    RequiresPassword,
    /// 拒否
    Denied(ShareDenyReason),
}

/// 共有リンクの拒否理由
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareDenyReason {
    Inactive,
    Expired,
    ViewLimitExceeded,
    EmailMismatch,
}

impl ShareDenyReason {
    pub fn error_type(&self) -> &'static str {
        match self {
            ShareDenyReason::Inactive => "inactive",
            ShareDenyReason::Expired => "expired",
            ShareDenyReason::ViewLimitExceeded => "view_limit_exceeded",
            ShareDenyReason::EmailMismatch => "email_mismatch",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ShareDenyReason::Inactive => "This share link has been deactivated",
            ShareDenyReason::Expired => "This share link has expired",
            ShareDenyReason::ViewLimitExceeded => "This share link has reached its view limit",
            ShareDenyReason::EmailMismatch => {
                "This share link is restricted to a different email address"
            }
        }
    }
}

impl std::fmt::Display for ShareDenyReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.message())
    }
}

impl Model {
    /// 共有リンクのアクセスポリシーを評価する
    ///
    /// 判定順序は固定：無効化 → 期限切れ → 閲覧回数超過 → メール制限 →
    /// パスワード。先に一致した条件で打ち切る。無効化済みかつ期限切れの
    /// リンクは常に Inactive を報告し、閲覧回数を超過したパスワード付き
    /// リンクはパスワード入力を求めず ViewLimitExceeded を返す（パスワード
    /// が有効であることを漏らさないため）。この順序を変えるとクライアント
    /// が複合条件下で受け取るエラーが変わる。
    pub fn evaluate_access(
        &self,
        requester_email: Option<&str>,
        password_verified: bool,
        now: DateTime<Utc>,
    ) -> ShareAccessDecision {
        if !self.is_active {
            return ShareAccessDecision::Denied(ShareDenyReason::Inactive);
        }

        if let Some(expires_at) = self.expires_at {
            if now > expires_at {
                return ShareAccessDecision::Denied(ShareDenyReason::Expired);
            }
        }

        if let Some(max_views) = self.max_views {
            if self.view_count >= max_views {
                return ShareAccessDecision::Denied(ShareDenyReason::ViewLimitExceeded);
            }
        }

        if let Some(restrict_to_email) = &self.restrict_to_email {
            let matches = requester_email
                .map(|email| email.eq_ignore_ascii_case(restrict_to_email))
                .unwrap_or(false);
            if !matches {
                return ShareAccessDecision::Denied(ShareDenyReason::EmailMismatch);
            }
        }

        if self.password_hash.is_some() && !password_verified {
            return ShareAccessDecision::RequiresPassword;
        }

        ShareAccessDecision::Allowed
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| now > at).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_link() -> Model {
        Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            share_key: "testShareKey123".to_string(),
            password_hash: None,
            expires_at: None,
            max_views: None,
            restrict_to_email: None,
            can_download: false,
            is_active: true,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_open_link_is_allowed() {
        let link = base_link();
        assert_eq!(
            link.evaluate_access(Some("anyone@example.com"), false, Utc::now()),
            ShareAccessDecision::Allowed
        );
    }

    #[test]
    fn test_inactive_link_is_denied_regardless_of_other_fields() {
        let now = Utc::now();
        let link = Model {
            is_active: false,
            expires_at: Some(now - Duration::hours(1)),
            max_views: Some(1),
            view_count: 5,
            password_hash: Some("$argon2id$dummy".to_string()),
            ..base_link()
        };

        // 期限切れ・回数超過・パスワードがすべて重なっていても Inactive が先
        assert_eq!(
            link.evaluate_access(Some("a@example.com"), true, now),
            ShareAccessDecision::Denied(ShareDenyReason::Inactive)
        );
    }

    #[test]
    fn test_expired_takes_precedence_over_view_limit() {
        let now = Utc::now();
        let link = Model {
            expires_at: Some(now - Duration::minutes(5)),
            max_views: Some(1),
            view_count: 3,
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(None, false, now),
            ShareAccessDecision::Denied(ShareDenyReason::Expired)
        );
    }

    #[test]
    fn test_view_limit_exceeded_even_if_not_expired() {
        let now = Utc::now();
        let link = Model {
            expires_at: Some(now + Duration::hours(1)),
            max_views: Some(3),
            view_count: 3,
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(None, false, now),
            ShareAccessDecision::Denied(ShareDenyReason::ViewLimitExceeded)
        );
    }

    #[test]
    fn test_view_limit_takes_precedence_over_password() {
        // 回数超過とパスワード保護が重なった場合、パスワード入力を求めては
        // ならない（正しいパスワードなら通ることを漏らすため）
        let link = Model {
            max_views: Some(1),
            view_count: 1,
            password_hash: Some("$argon2id$dummy".to_string()),
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(Some("a@example.com"), false, Utc::now()),
            ShareAccessDecision::Denied(ShareDenyReason::ViewLimitExceeded)
        );
    }

    #[test]
    fn test_email_mismatch_even_with_valid_password_capability() {
        let link = Model {
            restrict_to_email: Some("allowed@example.com".to_string()),
            password_hash: Some("$argon2id$dummy".to_string()),
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(Some("other@example.com"), true, Utc::now()),
            ShareAccessDecision::Denied(ShareDenyReason::EmailMismatch)
        );
    }

    #[test]
    fn test_email_restriction_is_case_insensitive() {
        let link = Model {
            restrict_to_email: Some("Allowed@Example.com".to_string()),
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(Some("allowed@example.com"), false, Utc::now()),
            ShareAccessDecision::Allowed
        );
    }

    #[test]
    fn test_missing_requester_email_fails_restriction() {
        let link = Model {
            restrict_to_email: Some("allowed@example.com".to_string()),
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(None, false, Utc::now()),
            ShareAccessDecision::Denied(ShareDenyReason::EmailMismatch)
        );
    }

    #[test]
    fn test_password_protected_link_requires_password() {
        let link = Model {
            password_hash: Some("$argon2id$dummy".to_string()),
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(Some("a@example.com"), false, Utc::now()),
            ShareAccessDecision::RequiresPassword
        );
        assert_eq!(
            link.evaluate_access(Some("a@example.com"), true, Utc::now()),
            ShareAccessDecision::Allowed
        );
    }

    #[test]
    fn test_view_under_limit_is_allowed() {
        let link = Model {
            max_views: Some(3),
            view_count: 2,
            ..base_link()
        };

        assert_eq!(
            link.evaluate_access(None, false, Utc::now()),
            ShareAccessDecision::Allowed
        );
    }
}
