// studyroom-backend/src/service/document_share_service.rs

use crate::db::DbPool;
use crate::domain::document_model;
use crate::domain::document_share_model;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::repository::document_share_repository::{
    CreateDocumentShareDto, DocumentShareRepository,
};
use crate::repository::user_repository::UserRepository;
use crate::service::document_service::DocumentService;
use crate::utils::email::EmailService;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct DocumentShareService {
    share_repo: Arc<DocumentShareRepository>,
    user_repo: Arc<UserRepository>,
    document_service: Arc<DocumentService>,
    email_service: Arc<EmailService>,
}

/// メール共有作成の入力
#[derive(Debug, Clone)]
pub struct CreateEmailShareInput {
    pub document_id: Uuid,
    pub recipient_email: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub can_download: bool,
    pub note: Option<String>,
}

/// 受信トレイの1件（共有元・ドキュメント情報を解決済み）
pub struct InboxEntry {
    pub share: document_share_model::Model,
    pub document: Option<document_model::Model>,
    pub shared_by_email: Option<String>,
}

/// 受信トレイの1ページ
pub struct InboxPage {
    pub entries: Vec<InboxEntry>,
    pub total: u64,
}

impl DocumentShareService {
    pub fn new(
        db_pool: DbPool,
        document_service: Arc<DocumentService>,
        email_service: Arc<EmailService>,
    ) -> Self {
        Self {
            share_repo: Arc::new(DocumentShareRepository::new(db_pool.clone())),
            user_repo: Arc::new(UserRepository::new(db_pool)),
            document_service,
            email_service,
        }
    }

    /// メール共有を作成
    ///
    /// 受信者が登録済みユーザーなら shared_with_user_id、未登録なら
    /// shared_with_email に紐付ける。通知メールの送信は応答から切り離し、
    /// 失敗してもリクエストは成功させる。
    pub async fn create_email_share(
        &self,
        user: &AuthenticatedUser,
        input: CreateEmailShareInput,
    ) -> AppResult<document_share_model::Model> {
        let recipient_email = input.recipient_email.trim().to_lowercase();

        // 自分自身への共有は拒否
        if recipient_email.eq_ignore_ascii_case(user.email()) {
            return Err(AppError::ValidationError(
                "email: You cannot share a document with yourself".to_string(),
            ));
        }

        if let Some(expires_at) = input.expires_at {
            if expires_at <= Utc::now() {
                return Err(AppError::ValidationError(
                    "expires_at: must be in the future".to_string(),
                ));
            }
        }

        // 共有者自身がそのドキュメントの閲覧権を持っていること
        let document = self
            .document_service
            .ensure_can_view(Some(user), input.document_id)
            .await?;

        // 受信者が登録済みユーザーならIDで紐付ける
        let recipient_user = self.user_repo.find_by_email(&recipient_email).await?;
        let recipient_user_id = recipient_user.as_ref().map(|u| u.id);

        // 同じ宛先への有効な共有が既にあれば拒否
        let duplicate = self
            .share_repo
            .find_active_duplicate(
                input.document_id,
                user.user_id(),
                recipient_user_id,
                &recipient_email,
                Utc::now(),
            )
            .await?;
        if duplicate.is_some() {
            return Err(AppError::ValidationError(
                "email: This document is already shared with this recipient".to_string(),
            ));
        }

        let share = self
            .share_repo
            .create(CreateDocumentShareDto {
                document_id: input.document_id,
                shared_by_user_id: user.user_id(),
                shared_with_user_id: recipient_user_id,
                shared_with_email: if recipient_user_id.is_some() {
                    None
                } else {
                    Some(recipient_email.clone())
                },
                expires_at: input.expires_at,
                can_download: input.can_download,
                note: input.note.clone(),
            })
            .await?;

        info!(
            user_id = %user.user_id(),
            document_id = %input.document_id,
            share_id = %share.id,
            recipient_registered = recipient_user_id.is_some(),
            "Email share created"
        );

        // 通知メールはfire-and-forget。配送失敗で共有作成を失敗させない
        let email_service = self.email_service.clone();
        let sharer_email = user.email().to_string();
        let document_title = document.title.clone();
        let note = input.note.clone();
        tokio::spawn(async move {
            if let Err(e) = email_service
                .send_document_shared(
                    &recipient_email,
                    &sharer_email,
                    &document_title,
                    note.as_deref(),
                )
                .await
            {
                warn!(error = %e, "Failed to send share notification email");
            }
        });

        Ok(share)
    }

    /// メール共有を取り消し（行削除）
    ///
    /// 元の共有者のみ。削除された共有は受信者の次回の受信トレイ取得から
    /// 消える。
    pub async fn revoke_email_share(
        &self,
        user: &AuthenticatedUser,
        share_id: Uuid,
    ) -> AppResult<()> {
        let share = self
            .share_repo
            .find_by_id(share_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Share not found".to_string()))?;

        if share.shared_by_user_id != user.user_id() {
            return Err(AppError::Forbidden(
                "You don't have permission to revoke this share".to_string(),
            ));
        }

        self.share_repo.delete(share_id).await?;

        info!(
            user_id = %user.user_id(),
            share_id = %share_id,
            "Email share revoked"
        );

        Ok(())
    }

    /// 受信トレイを取得
    ///
    /// ユーザーIDとメールアドレスの両方で照合するため、共有時点で未登録
    /// だった受信者が後から登録してもメール経由の共有が表示される。
    pub async fn get_inbox(
        &self,
        user: &AuthenticatedUser,
        page: i32,
        limit: i32,
    ) -> AppResult<InboxPage> {
        let offset = ((page - 1) * limit) as u64;

        let (rows, total) = self
            .share_repo
            .find_inbox_page(
                user.user_id(),
                user.email(),
                offset,
                limit as u64,
                Utc::now(),
            )
            .await?;

        // 共有元ユーザーのメールアドレスをまとめて解決
        let sharer_ids: Vec<Uuid> = rows
            .iter()
            .map(|(share, _)| share.shared_by_user_id)
            .collect();
        let sharer_emails: HashMap<Uuid, String> = self
            .user_repo
            .find_by_ids(sharer_ids)
            .await?
            .into_iter()
            .map(|u| (u.id, u.email))
            .collect();

        let entries = rows
            .into_iter()
            .map(|(share, document)| {
                let shared_by_email = sharer_emails.get(&share.shared_by_user_id).cloned();
                InboxEntry {
                    share,
                    document,
                    shared_by_email,
                }
            })
            .collect();

        Ok(InboxPage { entries, total })
    }
}
