// studyroom-backend/src/api/handlers/document_handler.rs

use crate::api::dto::document_dto::{
    DocumentDto, DocumentListResponse, DocumentPageDto, DocumentPageListResponse,
    DocumentViewResponse,
};
use crate::api::AppState;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthenticatedUser;
use crate::service::storage_service::sanitize_filename;
use crate::types::ApiResponse;
use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

/// アップロードの最大サイズ（50MB）
const MAX_UPLOAD_SIZE: usize = 50 * 1024 * 1024;

/// 所有ドキュメントの一覧
pub async fn list_documents(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> AppResult<impl IntoResponse> {
    let documents = state.document_service.list_documents(user.user_id()).await?;

    let documents: Vec<DocumentDto> = documents.into_iter().map(DocumentDto::from).collect();
    let total = documents.len();

    Ok(ApiResponse::success(DocumentListResponse {
        documents,
        total,
    }))
}

/// ドキュメントをアップロード（multipart: title, file）
pub async fn upload_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    mut multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let mut title: Option<String> = None;
    let mut file_name: Option<String> = None;
    let mut content_type: Option<String> = None;
    let mut file_data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart request: {}", e)))?
    {
        let field_name = field.name().map(|name| name.to_string());
        match field_name.as_deref() {
            Some("title") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Invalid title field: {}", e)))?;
                title = Some(text);
            }
            Some("file") => {
                file_name = field.file_name().map(sanitize_filename);
                content_type = field.content_type().map(|ct| ct.to_string());

                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("Failed to read file: {}", e)))?;

                if bytes.len() > MAX_UPLOAD_SIZE {
                    return Err(AppError::ValidationError(
                        "file: File exceeds the maximum allowed size".to_string(),
                    ));
                }

                file_data = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let file_name = file_name
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::ValidationError("file: File is required".to_string()))?;
    let file_data = file_data
        .ok_or_else(|| AppError::ValidationError("file: File is required".to_string()))?;
    let content_type = content_type.unwrap_or_else(|| "application/octet-stream".to_string());
    let title = title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| file_name.clone());

    let document = state
        .document_service
        .upload_document(&user, title, file_name, content_type, file_data)
        .await?;

    Ok((StatusCode::CREATED, Json(DocumentDto::from(document))))
}

/// ドキュメントを削除
pub async fn delete_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(document_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    state
        .document_service
        .delete_document(&user, document_id)
        .await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Document deleted"
    })))
}

/// ドキュメント閲覧（署名付きURLを発行）
///
/// パスパラメータはドキュメントIDのほかStudyRoomアイテムIDも受け付け、
/// 解決してから認可する。
pub async fn view_document(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let resolved = state.document_service.resolve_viewer_id(raw_id).await?;

    let (document, signed_url) = state
        .document_service
        .generate_view_url(Some(&user), resolved.document_id)
        .await?;

    Ok(ApiResponse::success(DocumentViewResponse {
        document: DocumentDto::from(document),
        signed_url,
    }))
}

/// ドキュメントのページ一覧（ページごとの署名付きURL付き）
pub async fn list_document_pages(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(raw_id): Path<Uuid>,
) -> AppResult<impl IntoResponse> {
    let resolved = state.document_service.resolve_viewer_id(raw_id).await?;

    let pages = state
        .document_service
        .list_pages(Some(&user), resolved.document_id)
        .await?;

    let pages: Vec<DocumentPageDto> = pages.into_iter().map(DocumentPageDto::from).collect();
    let total = pages.len();

    Ok(ApiResponse::success(DocumentPageListResponse {
        pages,
        total,
    }))
}
