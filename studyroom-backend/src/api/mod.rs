// studyroom-backend/src/api/mod.rs

use crate::config::Config;
use crate::db::DbPool;
use crate::middleware::auth::jwt_auth_middleware;
use crate::middleware::rate_limit::RateLimiter;
use crate::service::analytics_service::AnalyticsService;
use crate::service::auth_service::AuthService;
use crate::service::document_service::DocumentService;
use crate::service::document_share_service::DocumentShareService;
use crate::service::share_link_service::ShareLinkService;
use crate::service::storage_service::StorageService;
use crate::service::studyroom_service::StudyRoomService;
use crate::utils::capability::ShareCapabilityManager;
use crate::utils::email::EmailService;
use crate::utils::jwt::JwtManager;
use crate::utils::password::PasswordManager;
use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Json, Router,
};
use std::sync::Arc;

pub mod dto;
pub mod handlers;

/// 統一されたアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub document_service: Arc<DocumentService>,
    pub share_link_service: Arc<ShareLinkService>,
    pub document_share_service: Arc<DocumentShareService>,
    pub studyroom_service: Arc<StudyRoomService>,
    pub analytics_service: Arc<AnalyticsService>,
    pub rate_limiter: Arc<RateLimiter>,
    pub jwt_manager: Arc<JwtManager>,
    pub capability_manager: Arc<ShareCapabilityManager>,
    pub cookie_config: CookieConfig,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(
        db_pool: DbPool,
        config: Arc<Config>,
        storage: Arc<dyn StorageService>,
        jwt_manager: Arc<JwtManager>,
        password_manager: Arc<PasswordManager>,
        email_service: Arc<EmailService>,
        capability_manager: Arc<ShareCapabilityManager>,
    ) -> Self {
        let analytics_service = Arc::new(AnalyticsService::new(db_pool.clone()));
        let document_service = Arc::new(DocumentService::new(db_pool.clone(), storage.clone()));
        let share_link_service = Arc::new(ShareLinkService::new(
            db_pool.clone(),
            document_service.clone(),
            analytics_service.clone(),
            storage.clone(),
            password_manager.clone(),
        ));
        let document_share_service = Arc::new(DocumentShareService::new(
            db_pool.clone(),
            document_service.clone(),
            email_service.clone(),
        ));
        let studyroom_service = Arc::new(StudyRoomService::new(db_pool.clone()));
        let auth_service = Arc::new(AuthService::new(
            db_pool,
            password_manager,
            jwt_manager.clone(),
            email_service,
        ));

        Self {
            auth_service,
            document_service,
            share_link_service,
            document_share_service,
            studyroom_service,
            analytics_service,
            rate_limiter: Arc::new(RateLimiter::in_memory()),
            jwt_manager,
            capability_manager,
            cookie_config: CookieConfig::from_config(&config),
            config,
        }
    }
}

/// Cookie設定
#[derive(Clone, Debug)]
pub struct CookieConfig {
    pub secure: bool,
    pub http_only: bool,
    pub path: String,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            secure: std::env::var("APP_ENV").unwrap_or_default() == "production",
            http_only: true,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            secure: config.cookie_secure,
            http_only: true,
            path: "/".to_string(),
        }
    }
}

/// アプリケーションルーターを構築
pub fn build_router(state: AppState) -> Router {
    // 認証不要のエンドポイント
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(handlers::auth_handler::signup))
        .route("/api/auth/signin", post(handlers::auth_handler::signin))
        .route(
            "/api/auth/verify-email",
            post(handlers::auth_handler::verify_email),
        )
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth_handler::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth_handler::reset_password),
        )
        .route(
            "/api/share/{share_key}/verify-password",
            post(handlers::share_handler::verify_share_password),
        )
        .route(
            "/api/share/{share_key}/track",
            post(handlers::share_handler::track_share_view),
        );

    // 認証必須のエンドポイント
    let protected_routes = Router::new()
        .route(
            "/api/share/{share_key}",
            get(handlers::share_handler::access_share),
        )
        .route(
            "/api/share/link",
            post(handlers::share_handler::create_share_link),
        )
        .route(
            "/api/share/link/{id}/revoke",
            patch(handlers::share_handler::revoke_share_link),
        )
        .route(
            "/api/share/email",
            post(handlers::inbox_handler::create_email_share),
        )
        .route(
            "/api/share/email/{id}/revoke",
            delete(handlers::inbox_handler::revoke_email_share),
        )
        .route("/api/inbox", get(handlers::inbox_handler::get_inbox))
        .route(
            "/api/documents",
            get(handlers::document_handler::list_documents)
                .post(handlers::document_handler::upload_document),
        )
        .route(
            "/api/documents/{id}",
            delete(handlers::document_handler::delete_document),
        )
        .route(
            "/api/documents/{id}/view",
            get(handlers::document_handler::view_document),
        )
        .route(
            "/api/documents/{id}/pages",
            get(handlers::document_handler::list_document_pages),
        )
        .route(
            "/api/documents/{id}/share-links",
            get(handlers::share_handler::list_share_links),
        )
        .route(
            "/api/bookshop",
            get(handlers::studyroom_handler::list_bookshop_items),
        )
        .route(
            "/api/bookshop/items",
            post(handlers::studyroom_handler::create_bookshop_item),
        )
        .route(
            "/api/studyroom",
            get(handlers::studyroom_handler::list_study_room_items),
        )
        .route(
            "/api/studyroom/items",
            post(handlers::studyroom_handler::add_study_room_item),
        )
        .route_layer(middleware::from_fn_with_state(
            state.jwt_manager.clone(),
            jwt_auth_middleware,
        ));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// ヘルスチェック
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// CORS設定
fn cors_layer() -> tower_http::cors::CorsLayer {
    use axum::http::{header, Method};
    use tower_http::cors::{AllowOrigin, CorsLayer};

    let allowed_origin = std::env::var("FRONTEND_URL")
        .ok()
        .and_then(|url| url.parse().ok());

    let origin = match allowed_origin {
        Some(origin) => AllowOrigin::exact(origin),
        None => AllowOrigin::mirror_request(),
    };

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
