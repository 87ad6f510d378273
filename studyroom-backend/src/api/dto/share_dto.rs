// studyroom-backend/src/api/dto/share_dto.rs

use crate::domain::share_link_model;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 共有リンク作成リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct CreateShareLinkRequest {
    pub document_id: Uuid,
    /// 閲覧用の合言葉（任意）
    pub password: Option<String>,
    /// 有効期限（時間）。最小1時間、最大720時間（30日）。省略時は無期限
    pub expires_in_hours: Option<u32>,
    /// 最大閲覧回数（任意）
    pub max_views: Option<i32>,
    /// このメールアドレスのユーザーのみ閲覧可（任意）
    #[validate(email(message = "Invalid email format"))]
    pub restrict_to_email: Option<String>,
    #[serde(default)]
    pub can_download: bool,
}

/// パスワード検証リクエスト
#[derive(Deserialize, Debug, Validate)]
pub struct VerifySharePasswordRequest {
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// 閲覧トラッキングリクエスト
#[derive(Deserialize, Debug, Default)]
pub struct TrackViewRequest {
    /// 閲覧時間（秒）
    pub duration_secs: Option<i32>,
}

/// 共有リンク情報
#[derive(Serialize, Debug)]
pub struct ShareLinkDto {
    pub id: Uuid,
    pub document_id: Uuid,
    pub created_by: Uuid,
    pub share_key: String,
    pub has_password: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_views: Option<i32>,
    pub restrict_to_email: Option<String>,
    pub can_download: bool,
    pub is_active: bool,
    pub view_count: i32,
    pub created_at: DateTime<Utc>,
    /// フルURLを構築して返す
    pub share_url: String,
}

impl ShareLinkDto {
    pub fn from_model(model: share_link_model::Model, base_url: &str) -> Self {
        let share_url = format!("{}/share/{}", base_url, model.share_key);

        Self {
            id: model.id,
            document_id: model.document_id,
            created_by: model.created_by,
            has_password: model.password_hash.is_some(),
            share_key: model.share_key,
            expires_at: model.expires_at,
            max_views: model.max_views,
            restrict_to_email: model.restrict_to_email,
            can_download: model.can_download,
            is_active: model.is_active,
            view_count: model.view_count,
            created_at: model.created_at,
            share_url,
        }
    }
}

/// 共有リンク作成レスポンス
#[derive(Serialize, Debug)]
pub struct CreateShareLinkResponse {
    pub share_link: ShareLinkDto,
    pub message: String,
}

/// 共有リンク一覧レスポンス
#[derive(Serialize, Debug)]
pub struct ShareLinkListResponse {
    pub share_links: Vec<ShareLinkDto>,
    pub total: usize,
}

/// 共有リンク経由で閲覧するドキュメント情報
#[derive(Serialize, Debug)]
pub struct SharedDocumentDto {
    pub id: Uuid,
    pub title: String,
    pub file_name: String,
}

/// 共有リンクアクセスレスポンス
#[derive(Serialize, Debug)]
pub struct ShareAccessResponse {
    pub document: SharedDocumentDto,
    pub signed_url: String,
    pub can_download: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_link_dto_hides_password_hash() {
        let model = share_link_model::Model {
            id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            created_by: Uuid::new_v4(),
            share_key: "key123".to_string(),
            password_hash: Some("$argon2id$secret".to_string()),
            expires_at: None,
            max_views: None,
            restrict_to_email: None,
            can_download: true,
            is_active: true,
            view_count: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let dto = ShareLinkDto::from_model(model, "https://app.example.com");
        assert!(dto.has_password);
        assert_eq!(dto.share_url, "https://app.example.com/share/key123");

        let json = serde_json::to_string(&dto).unwrap();
        assert!(!json.contains("argon2"));
    }
}
