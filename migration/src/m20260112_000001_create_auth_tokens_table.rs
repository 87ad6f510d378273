use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthTokens::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AuthTokens::TokenHash)
                            .string_len(255)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::Purpose)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::IsConsumed)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(AuthTokens::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_auth_tokens_user_id")
                            .from(AuthTokens::Table, AuthTokens::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // トークンハッシュ＋用途での検索用インデックス（消費時の主要経路）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_token_hash_purpose")
                    .col(AuthTokens::TokenHash)
                    .col(AuthTokens::Purpose)
                    .to_owned(),
            )
            .await?;

        // ユーザー別の一括無効化用インデックス
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_user_id_purpose")
                    .col(AuthTokens::UserId)
                    .col(AuthTokens::Purpose)
                    .to_owned(),
            )
            .await?;

        // 有効期限でのクリーンアップ用インデックス
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_expires_at")
                    .col(AuthTokens::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_expires_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_user_id_purpose")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(AuthTokens::Table)
                    .name("idx_auth_tokens_token_hash_purpose")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(AuthTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AuthTokens {
    Table,
    Id,
    UserId,
    TokenHash,
    Purpose,
    ExpiresAt,
    IsConsumed,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
