use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ViewAnalytics::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ViewAnalytics::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ViewAnalytics::DocumentId).uuid().not_null())
                    .col(
                        ColumnDef::new(ViewAnalytics::ShareKey)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ViewAnalytics::ViewerEmail)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ViewAnalytics::IpAddress)
                            .string_len(64)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ViewAnalytics::UserAgent)
                            .string_len(512)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(ViewAnalytics::Country)
                            .string_len(100)
                            .null(),
                    )
                    .col(ColumnDef::new(ViewAnalytics::City).string_len(100).null())
                    .col(ColumnDef::new(ViewAnalytics::DurationSecs).integer().null())
                    .col(
                        ColumnDef::new(ViewAnalytics::ViewedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_view_analytics_document_id")
                            .from(ViewAnalytics::Table, ViewAnalytics::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(ViewAnalytics::Table)
                    .name("idx_view_analytics_document_id")
                    .col(ViewAnalytics::DocumentId)
                    .to_owned(),
            )
            .await?;

        // 保持期間パージ用インデックス
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(ViewAnalytics::Table)
                    .name("idx_view_analytics_viewed_at")
                    .col(ViewAnalytics::ViewedAt)
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
                    .table(ViewAnalytics::Table)
                    .name("idx_view_analytics_viewed_at")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(ViewAnalytics::Table)
                    .name("idx_view_analytics_document_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(ViewAnalytics::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ViewAnalytics {
    Table,
    Id,
    DocumentId,
    ShareKey,
    ViewerEmail,
    IpAddress,
    UserAgent,
    Country,
    City,
    DurationSecs,
    ViewedAt,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
}
