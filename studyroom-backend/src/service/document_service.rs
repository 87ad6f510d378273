// studyroom-backend/src/service/document_service.rs

use crate::db::DbPool;
use crate::domain::document_model;
use crate::domain::document_page_model;
use crate::domain::role::RoleName;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::repository::document_page_repository::DocumentPageRepository;
use crate::repository::document_repository::{CreateDocumentDto, DocumentRepository};
use crate::repository::study_room_repository::StudyRoomRepository;
use crate::repository::user_repository::UserRepository;
use crate::service::storage_service::{
    generate_document_key, StorageService, DOCUMENT_VIEW_URL_EXPIRY_SECS,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

pub struct DocumentService {
    document_repo: Arc<DocumentRepository>,
    page_repo: Arc<DocumentPageRepository>,
    user_repo: Arc<UserRepository>,
    study_room_repo: Arc<StudyRoomRepository>,
    storage: Arc<dyn StorageService>,
}

/// ビューアーIDの解決結果
///
/// ビューアーには生のドキュメントIDのほか、MyStudyRoomアイテムのIDが
/// 渡ってくることがある。閲覧認可は解決済みのドキュメントIDに対して行う。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedViewer {
    pub document_id: Uuid,
    pub resolved_from: ResolvedFrom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolvedFrom {
    Document,
    StudyRoomItem,
}

/// ページ一覧の1要素（署名付きURL付き）
pub struct PageWithUrl {
    pub page: document_page_model::Model,
    pub signed_url: String,
}

impl DocumentService {
    pub fn new(db_pool: DbPool, storage: Arc<dyn StorageService>) -> Self {
        Self {
            document_repo: Arc::new(DocumentRepository::new(db_pool.clone())),
            page_repo: Arc::new(DocumentPageRepository::new(db_pool.clone())),
            user_repo: Arc::new(UserRepository::new(db_pool.clone())),
            study_room_repo: Arc::new(StudyRoomRepository::new(db_pool)),
            storage,
        }
    }

    /// ドキュメント閲覧認可
    ///
    /// 判定優先順位：
    /// 1. 未認証 → Unauthorized
    /// 2. ドキュメント不在 → NotFound（認可失敗と区別できるようにする）
    /// 3. ADMIN（追加ロール含む）→ 無条件で許可（未公開でもプレビュー可）
    /// 4. MEMBERエンタイトルメント：公開中のBookshopアイテム経由で本人の
    ///    StudyRoomに入っていれば許可
    /// 5. 所有者 → ロールに関係なく許可
    /// 6. それ以外 → Forbidden
    ///
    /// MEMBERと所有者の判定は独立に合算されるため順序に依存しない。
    pub async fn ensure_can_view(
        &self,
        user: Option<&AuthenticatedUser>,
        document_id: Uuid,
    ) -> AppResult<document_model::Model> {
        let Some(user) = user else {
            return Err(AppError::Unauthorized("Authentication required".to_string()));
        };

        let document = self
            .document_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if user.is_admin() {
            return Ok(document);
        }

        if user.has_role(RoleName::Member)
            && self
                .study_room_repo
                .member_has_document(user.user_id(), document_id)
                .await?
        {
            return Ok(document);
        }

        if document.user_id == user.user_id() {
            return Ok(document);
        }

        warn!(
            user_id = %user.user_id(),
            document_id = %document_id,
            "Document view denied"
        );
        Err(AppError::Forbidden("Access denied".to_string()))
    }

    /// 認可を伴わない素のドキュメント取得
    ///
    /// 共有リンクのポリシー評価を通過した後など、別経路で認可済みの
    /// 呼び出し専用。
    pub async fn find_document(
        &self,
        document_id: Uuid,
    ) -> AppResult<Option<document_model::Model>> {
        self.document_repo.find_by_id(document_id).await
    }

    /// 生IDをドキュメントIDに解決
    ///
    /// まずドキュメントIDとして解釈し、だめならStudyRoomアイテムIDとして
    /// 背後のドキュメントまで辿る。
    pub async fn resolve_viewer_id(&self, raw_id: Uuid) -> AppResult<ResolvedViewer> {
        if self.document_repo.find_by_id(raw_id).await?.is_some() {
            return Ok(ResolvedViewer {
                document_id: raw_id,
                resolved_from: ResolvedFrom::Document,
            });
        }

        if let Some(item) = self.study_room_repo.find_study_room_item_by_id(raw_id).await? {
            let bookshop_item = self
                .study_room_repo
                .find_bookshop_item_by_id(item.bookshop_item_id)
                .await?
                .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

            return Ok(ResolvedViewer {
                document_id: bookshop_item.document_id,
                resolved_from: ResolvedFrom::StudyRoomItem,
            });
        }

        Err(AppError::NotFound("Document not found".to_string()))
    }

    /// ダッシュボード閲覧用の署名付きURLを発行
    ///
    /// 認可チェックを通過した後にのみ生成する。URLは都度生成し保存しない。
    pub async fn generate_view_url(
        &self,
        user: Option<&AuthenticatedUser>,
        document_id: Uuid,
    ) -> AppResult<(document_model::Model, String)> {
        let document = self.ensure_can_view(user, document_id).await?;

        let signed_url = self
            .storage
            .generate_download_url(&document.storage_key, DOCUMENT_VIEW_URL_EXPIRY_SECS)
            .await?;

        Ok((document, signed_url))
    }

    /// ページ一覧を署名付きURL付きで取得
    pub async fn list_pages(
        &self,
        user: Option<&AuthenticatedUser>,
        document_id: Uuid,
    ) -> AppResult<Vec<PageWithUrl>> {
        self.ensure_can_view(user, document_id).await?;

        let pages = self.page_repo.find_by_document_id(document_id).await?;

        let mut result = Vec::with_capacity(pages.len());
        for page in pages {
            let signed_url = self
                .storage
                .generate_download_url(&page.storage_key, DOCUMENT_VIEW_URL_EXPIRY_SECS)
                .await?;
            result.push(PageWithUrl { page, signed_url });
        }

        Ok(result)
    }

    /// ドキュメントをアップロードして登録
    pub async fn upload_document(
        &self,
        user: &AuthenticatedUser,
        title: String,
        file_name: String,
        content_type: String,
        file_data: Vec<u8>,
    ) -> AppResult<document_model::Model> {
        if file_data.is_empty() {
            return Err(AppError::ValidationError(
                "file: File must not be empty".to_string(),
            ));
        }

        let storage_key = generate_document_key(user.user_id());
        let file_size = file_data.len() as i64;

        self.storage
            .upload(&storage_key, file_data, &content_type)
            .await?;

        let document = self
            .document_repo
            .create(CreateDocumentDto {
                user_id: user.user_id(),
                title,
                file_name,
                storage_key,
                content_type,
                file_size,
            })
            .await?;

        // 無料枠カウンタを更新（Bookshop購入分は決済フローの責務）
        self.user_repo
            .adjust_free_document_count(user.user_id(), 1)
            .await?;

        info!(
            user_id = %user.user_id(),
            document_id = %document.id,
            "Document uploaded"
        );

        Ok(document)
    }

    /// 所有ドキュメントの一覧
    pub async fn list_documents(&self, user_id: Uuid) -> AppResult<Vec<document_model::Model>> {
        self.document_repo.find_by_user_id(user_id).await
    }

    /// ドキュメントを削除
    ///
    /// 所有者または管理者のみ。DB行の削除が成功すればストレージ側の削除
    /// 失敗はログに留める（孤児オブジェクトは後続のクリーンアップで回収）。
    pub async fn delete_document(
        &self,
        user: &AuthenticatedUser,
        document_id: Uuid,
    ) -> AppResult<()> {
        let document = self
            .document_repo
            .find_by_id(document_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Document not found".to_string()))?;

        if document.user_id != user.user_id() && !user.is_admin() {
            return Err(AppError::Forbidden(
                "You don't have permission to delete this document".to_string(),
            ));
        }

        self.document_repo.delete(document_id).await?;

        self.user_repo
            .adjust_free_document_count(document.user_id, -1)
            .await?;

        if let Err(e) = self.storage.delete(&document.storage_key).await {
            warn!(
                error = %e,
                document_id = %document_id,
                "Failed to delete storage object for deleted document"
            );
        }

        info!(
            user_id = %user.user_id(),
            document_id = %document_id,
            "Document deleted"
        );

        Ok(())
    }
}
