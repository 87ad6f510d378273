// studyroom-backend/src/api/dto/inbox_dto.rs

use crate::domain::document_share_model;
use crate::service::document_share_service::InboxEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// メール共有作成リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct CreateEmailShareRequest {
    pub document_id: Uuid,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub expires_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub can_download: bool,

    #[validate(length(max = 1000, message = "Note must be at most 1000 characters"))]
    pub note: Option<String>,
}

/// メール共有情報
#[derive(Serialize, Debug)]
pub struct EmailShareDto {
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

impl From<document_share_model::Model> for EmailShareDto {
    fn from(model: document_share_model::Model) -> Self {
        Self {
            id: model.id,
            document_id: model.document_id,
            shared_by_user_id: model.shared_by_user_id,
            shared_with_user_id: model.shared_with_user_id,
            shared_with_email: model.shared_with_email,
            expires_at: model.expires_at,
            can_download: model.can_download,
            note: model.note,
            created_at: model.created_at,
        }
    }
}

/// メール共有作成レスポンス
#[derive(Serialize, Debug)]
pub struct CreateEmailShareResponse {
    pub share: EmailShareDto,
    pub message: String,
}

/// 受信トレイに表示するドキュメント情報
#[derive(Serialize, Debug)]
pub struct InboxDocumentDto {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
}

/// 受信トレイの1件
#[derive(Serialize, Debug)]
pub struct InboxItemDto {
    pub share_id: Uuid,
    pub document: Option<InboxDocumentDto>,
    pub shared_by_email: Option<String>,
    pub note: Option<String>,
    pub can_download: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<InboxEntry> for InboxItemDto {
    fn from(entry: InboxEntry) -> Self {
        Self {
            share_id: entry.share.id,
            document: entry.document.map(|d| InboxDocumentDto {
                id: d.id,
                title: d.title,
                file_name: d.file_name,
            }),
            shared_by_email: entry.shared_by_email,
            note: entry.share.note,
            can_download: entry.share.can_download,
            expires_at: entry.share.expires_at,
            created_at: entry.share.created_at,
        }
    }
}
