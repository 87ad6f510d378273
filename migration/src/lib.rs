// migration/src/lib.rs
pub use sea_orm_migration::prelude::*;

// 基本テーブルマイグレーション
mod m20260110_000001_create_users_table;
mod m20260110_000002_create_documents_table;
mod m20260110_000003_create_document_pages_table;

// 共有関連マイグレーション
mod m20260111_000001_create_share_links_table;
mod m20260111_000002_create_document_shares_table;
mod m20260111_000003_create_view_analytics_table;

// 認証トークン関連マイグレーション
mod m20260112_000001_create_auth_tokens_table;

// Bookshop / StudyRoom 関連マイグレーション
mod m20260118_000001_create_bookshop_items_table;
mod m20260118_000002_create_study_room_items_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            // 1. 基本テーブル作成（依存関係なし → users → documents の順）
            Box::new(m20260110_000001_create_users_table::Migration),
            Box::new(m20260110_000002_create_documents_table::Migration),
            Box::new(m20260110_000003_create_document_pages_table::Migration),
            // 2. 共有関連テーブル（documents / users に依存）
            Box::new(m20260111_000001_create_share_links_table::Migration),
            Box::new(m20260111_000002_create_document_shares_table::Migration),
            Box::new(m20260111_000003_create_view_analytics_table::Migration),
            // 3. 認証トークンテーブル
            Box::new(m20260112_000001_create_auth_tokens_table::Migration),
            // 4. Bookshop / StudyRoom テーブル
            Box::new(m20260118_000001_create_bookshop_items_table::Migration),
            Box::new(m20260118_000002_create_study_room_items_table::Migration),
        ]
    }
}
