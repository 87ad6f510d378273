use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentShares::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentShares::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::DocumentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::SharedByUserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::SharedWithUserId)
                            .uuid()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::SharedWithEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::ExpiresAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::CanDownload)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::Note)
                            .string_len(1000)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(DocumentShares::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_shares_document_id")
                            .from(DocumentShares::Table, DocumentShares::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_shares_shared_by_user_id")
                            .from(DocumentShares::Table, DocumentShares::SharedByUserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // 受信トレイ取得用インデックス（ユーザーID・メールの両経路）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_shared_with_user_id")
                    .col(DocumentShares::SharedWithUserId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_shared_with_email")
                    .col(DocumentShares::SharedWithEmail)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_document_id")
                    .col(DocumentShares::DocumentId)
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
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_document_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_shared_with_email")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(DocumentShares::Table)
                    .name("idx_document_shares_shared_with_user_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DocumentShares::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentShares {
    Table,
    Id,
    DocumentId,
    SharedByUserId,
    SharedWithUserId,
    SharedWithEmail,
    ExpiresAt,
    CanDownload,
    Note,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}
