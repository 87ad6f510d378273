// studyroom-backend/src/api/dto/document_dto.rs

use crate::domain::document_model;
use crate::service::document_service::PageWithUrl;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// ドキュメント情報
#[derive(Serialize, Debug)]
pub struct DocumentDto {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub file_name: String,
    pub content_type: String,
    pub file_size: i64,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<document_model::Model> for DocumentDto {
    fn from(model: document_model::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            file_name: model.file_name,
            content_type: model.content_type,
            file_size: model.file_size,
            page_count: model.page_count,
            created_at: model.created_at,
        }
    }
}

/// ドキュメント一覧レスポンス
#[derive(Serialize, Debug)]
pub struct DocumentListResponse {
    pub documents: Vec<DocumentDto>,
    pub total: usize,
}

/// ドキュメント閲覧レスポンス（署名付きURL付き）
#[derive(Serialize, Debug)]
pub struct DocumentViewResponse {
    pub document: DocumentDto,
    pub signed_url: String,
}

/// ページ情報（署名付きURL付き）
#[derive(Serialize, Debug)]
pub struct DocumentPageDto {
    pub page_number: i32,
    pub format: String,
    pub signed_url: String,
}

impl From<PageWithUrl> for DocumentPageDto {
    fn from(page_with_url: PageWithUrl) -> Self {
        Self {
            page_number: page_with_url.page.page_number,
            format: page_with_url.page.format,
            signed_url: page_with_url.signed_url,
        }
    }
}

/// ページ一覧レスポンス
#[derive(Serialize, Debug)]
pub struct DocumentPageListResponse {
    pub pages: Vec<DocumentPageDto>,
    pub total: usize,
}
