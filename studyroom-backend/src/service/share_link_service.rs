// studyroom-backend/src/service/share_link_service.rs

use crate::db::DbPool;
use crate::domain::document_model;
use crate::domain::share_link_model::{self, ShareAccessDecision, ShareDenyReason};
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::repository::share_link_repository::{CreateShareLinkDto, ShareLinkRepository};
use crate::service::analytics_service::{AnalyticsService, ViewEvent};
use crate::service::document_service::DocumentService;
use crate::service::storage_service::{StorageService, SHARE_VIEW_URL_EXPIRY_SECS};
use crate::utils::password::PasswordManager;
use crate::utils::token::generate_secure_token;
use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

/// 共有キーの長さ
const SHARE_KEY_LENGTH: usize = 32;

pub struct ShareLinkService {
    share_link_repo: Arc<ShareLinkRepository>,
    document_service: Arc<DocumentService>,
    analytics_service: Arc<AnalyticsService>,
    storage: Arc<dyn StorageService>,
    password_manager: Arc<PasswordManager>,
}

/// 共有リンク作成の入力
#[derive(Debug, Clone)]
pub struct CreateShareLinkInput {
    pub document_id: Uuid,
    pub password: Option<String>,
    /// 有効期限（時間）。最小1時間、最大720時間（30日）。None は無期限
    pub expires_in_hours: Option<u32>,
    pub max_views: Option<i32>,
    pub restrict_to_email: Option<String>,
    pub can_download: bool,
}

/// アクセス許可時の応答内容
pub struct ShareAccessGrant {
    pub share_link: share_link_model::Model,
    pub document: document_model::Model,
    pub signed_url: String,
    pub can_download: bool,
}

impl ShareLinkService {
    pub fn new(
        db_pool: DbPool,
        document_service: Arc<DocumentService>,
        analytics_service: Arc<AnalyticsService>,
        storage: Arc<dyn StorageService>,
        password_manager: Arc<PasswordManager>,
    ) -> Self {
        Self {
            share_link_repo: Arc::new(ShareLinkRepository::new(db_pool)),
            document_service,
            analytics_service,
            storage,
            password_manager,
        }
    }

    /// 共有リンクを作成
    ///
    /// 作成者自身がそのドキュメントの閲覧権を持っていることが前提条件。
    pub async fn create_share_link(
        &self,
        user: &AuthenticatedUser,
        input: CreateShareLinkInput,
    ) -> AppResult<share_link_model::Model> {
        self.document_service
            .ensure_can_view(Some(user), input.document_id)
            .await?;

        if let Some(max_views) = input.max_views {
            if max_views < 1 {
                return Err(AppError::ValidationError(
                    "max_views: must be at least 1".to_string(),
                ));
            }
        }

        let expires_at = input.expires_in_hours.map(|hours| {
            let hours = hours.clamp(1, 24 * 30);
            Utc::now() + Duration::hours(hours as i64)
        });

        let password_hash = match &input.password {
            Some(password) => Some(
                self.password_manager
                    .hash_share_password(password)
                    .map_err(|e| AppError::InternalServerError(e.to_string()))?,
            ),
            None => None,
        };

        let share_link = self
            .share_link_repo
            .create(CreateShareLinkDto {
                document_id: input.document_id,
                created_by: user.user_id(),
                share_key: generate_secure_token(SHARE_KEY_LENGTH),
                password_hash,
                expires_at,
                max_views: input.max_views,
                restrict_to_email: input.restrict_to_email,
                can_download: input.can_download,
            })
            .await?;

        info!(
            user_id = %user.user_id(),
            document_id = %input.document_id,
            share_link_id = %share_link.id,
            "Share link created"
        );

        Ok(share_link)
    }

    /// 共有リンク経由のアクセスを処理
    ///
    /// ポリシー評価 → 許可時のみ閲覧回数をアトミックに1加算 → 署名付きURL
    /// 発行 → 閲覧イベント記録（fire-and-forget）。拒否・パスワード要求の
    /// 場合は閲覧回数を加算しない。
    pub async fn access_share(
        &self,
        share_key: &str,
        user: &AuthenticatedUser,
        password_verified: bool,
        ip_address: Option<String>,
        user_agent: Option<String>,
    ) -> AppResult<ShareAccessGrant> {
        let share_link = self
            .share_link_repo
            .find_by_share_key(share_key)
            .await?
            .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;

        match share_link.evaluate_access(Some(user.email()), password_verified, Utc::now()) {
            ShareAccessDecision::Denied(reason) => {
                return Err(AppError::ShareLinkDenied(reason));
            }
            ShareAccessDecision::RequiresPassword => {
                return Err(AppError::PasswordRequired);
            }
            ShareAccessDecision::Allowed => {}
        }

        // 条件付きUPDATEでの加算。同時アクセスで上限を取り合って負けた場合は
        // ここで閲覧回数超過として拒否される
        let incremented = self
            .share_link_repo
            .try_increment_view_count(share_link.id)
            .await?;
        if !incremented {
            return Err(AppError::ShareLinkDenied(ShareDenyReason::ViewLimitExceeded));
        }

        let document = self
            .document_service
            .find_document(share_link.document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        let signed_url = self
            .storage
            .generate_download_url(&document.storage_key, SHARE_VIEW_URL_EXPIRY_SECS)
            .await?;

        // 閲覧イベントはベストエフォートで記録し、応答をブロックしない
        let analytics = self.analytics_service.clone();
        let event = ViewEvent {
            document_id: document.id,
            share_key: Some(share_key.to_string()),
            viewer_email: Some(user.email().to_string()),
            ip_address,
            user_agent,
            duration_secs: None,
        };
        tokio::spawn(async move {
            analytics.record_view(event).await;
        });

        let can_download = share_link.can_download;
        Ok(ShareAccessGrant {
            share_link,
            document,
            signed_url,
            can_download,
        })
    }

    /// 共有リンクのパスワードを検証
    ///
    /// 404（リンク不在）以外では「リンクは存在するがパスワードが違う」
    /// 以上の情報を返さない。
    pub async fn verify_share_password(&self, share_key: &str, password: &str) -> AppResult<()> {
        let share_link = self
            .share_link_repo
            .find_by_share_key(share_key)
            .await?
            .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;

        let Some(password_hash) = &share_link.password_hash else {
            return Err(AppError::BadRequest(
                "This share link is not password protected".to_string(),
            ));
        };

        let verified = self
            .password_manager
            .verify_password(password, password_hash)
            .map_err(|e| AppError::InternalServerError(e.to_string()))?;

        if !verified {
            return Err(AppError::InvalidPassword);
        }

        Ok(())
    }

    /// ドキュメントの有効な共有リンク一覧
    pub async fn list_share_links(
        &self,
        user: &AuthenticatedUser,
        document_id: Uuid,
    ) -> AppResult<Vec<share_link_model::Model>> {
        self.document_service
            .ensure_can_view(Some(user), document_id)
            .await?;

        self.share_link_repo.find_by_document_id(document_id).await
    }

    /// 共有リンクを取り消し
    ///
    /// 作成者本人のみ。取り消したリンクは再有効化できない。
    pub async fn revoke_share_link(
        &self,
        user: &AuthenticatedUser,
        share_link_id: Uuid,
    ) -> AppResult<()> {
        let share_link = self
            .share_link_repo
            .find_by_id(share_link_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Share link not found".to_string()))?;

        if share_link.created_by != user.user_id() {
            return Err(AppError::Forbidden(
                "You don't have permission to revoke this share link".to_string(),
            ));
        }

        self.share_link_repo.revoke(share_link_id).await?;

        info!(
            user_id = %user.user_id(),
            share_link_id = %share_link_id,
            "Share link revoked"
        );

        Ok(())
    }
}
