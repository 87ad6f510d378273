// studyroom-backend/src/domain/document_share_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::Set;
use serde::{Deserialize, Serialize};

/// メールベースの直接共有
///
/// 作成時に shared_with_user_id / shared_with_email のどちらか一方だけが
/// 設定される。取り消しは論理削除ではなく行削除で、受信者の受信トレイから
/// 次回取得時に消える。
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "document_shares")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_id: Uuid,
    pub shared_by_user_id: Uuid,
    pub shared_with_user_id: Option<Uuid>,
    pub shared_with_email: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub can_download: bool,
    pub note: Option<String>,
    pub created_at: DateTime<Utc>,
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
        from = "Column::SharedByUserId",
        to = "crate::domain::user_model::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    SharedBy,
}

impl Related<crate::domain::document_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            can_download: Set(false),
            created_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }
}

impl Model {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|at| at <= now).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn base_share() -> Model {
        Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            shared_by_user_id: Uuid::new_v4(),
            shared_with_user_id: None,
            shared_with_email: Some("friend@example.com".to_string()),
            expires_at: None,
            can_download: false,
            note: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_share_without_expiry_never_expires() {
        assert!(!base_share().is_expired(Utc::now() + Duration::days(3650)));
    }

    #[test]
    fn test_expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let share = Model {
            expires_at: Some(now),
            ..base_share()
        };
        // expires_at ちょうどの時刻は期限切れ扱い
        assert!(share.is_expired(now));
        assert!(!share.is_expired(now - Duration::seconds(1)));
    }
}
