// studyroom-backend/src/main.rs
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod config;
mod db;
mod domain;
mod error;
mod middleware;
mod repository;
mod service;
mod types;
mod utils;

use crate::api::{build_router, AppState};
use crate::config::Config;
use crate::db::create_db_pool;
use crate::service::storage_service::{create_storage_service, StorageConfig};
use crate::utils::capability::ShareCapabilityManager;
use crate::utils::email::EmailService;
use crate::utils::jwt::JwtManager;
use crate::utils::password::PasswordManager;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // トレーシングの設定
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "studyroom_backend=info,tower_http=info".into()),
        )
        .with(fmt::layer())
        .init();

    tracing::info!("Starting StudyRoom backend server...");

    // 設定を読み込む
    let app_config = Arc::new(Config::from_env().expect("Failed to load configuration"));

    // データベース接続を作成
    let db_pool = create_db_pool(&app_config)
        .await
        .expect("Failed to create database pool");
    tracing::info!("Database pool created successfully.");

    // マイグレーションを適用
    use migration::{Migrator, MigratorTrait};
    Migrator::up(&db_pool, None)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied.");

    // 各種マネージャー・外部サービスの初期化
    let storage_config = StorageConfig::from_env().expect("Failed to load storage configuration");
    let storage = create_storage_service(storage_config)
        .await
        .expect("Failed to create storage service");

    let jwt_manager = Arc::new(JwtManager::from_env().expect("Failed to initialize JWT manager"));
    let password_manager =
        Arc::new(PasswordManager::from_env().expect("Failed to initialize password manager"));
    let email_service = Arc::new(
        EmailService::from_env(app_config.frontend_url.clone())
            .expect("Failed to initialize email service"),
    );
    let capability_manager = Arc::new(
        ShareCapabilityManager::from_env().expect("Failed to initialize capability manager"),
    );

    // アプリケーション状態の構築
    let state = AppState::new(
        db_pool,
        app_config.clone(),
        storage,
        jwt_manager,
        password_manager,
        email_service,
        capability_manager,
    );

    // レート制限マップの定期クリーンアップ
    let _cleanup_task = state
        .rate_limiter
        .spawn_cleanup_task(Duration::from_secs(300));

    // ルーターの設定
    let app_router = build_router(state);

    // サーバーの起動
    tracing::info!("Router configured. Server listening on {}", app_config.server_addr);

    let listener = TcpListener::bind(&app_config.server_addr).await?;
    axum::serve(listener, app_router.into_make_service()).await?;

    Ok(())
}
