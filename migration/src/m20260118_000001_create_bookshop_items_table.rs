use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookshopItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BookshopItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BookshopItems::DocumentId).uuid().not_null())
                    .col(
                        ColumnDef::new(BookshopItems::Title)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(BookshopItems::PriceCents)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(BookshopItems::IsPublished)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(BookshopItems::CreatedBy).uuid().not_null())
                    .col(
                        ColumnDef::new(BookshopItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(BookshopItems::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookshop_items_document_id")
                            .from(BookshopItems::Table, BookshopItems::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bookshop_items_created_by")
                            .from(BookshopItems::Table, BookshopItems::CreatedBy)
                            .to(Users::Table, Users::Id)
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
                    .table(BookshopItems::Table)
                    .name("idx_bookshop_items_document_id")
                    .col(BookshopItems::DocumentId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(BookshopItems::Table)
                    .name("idx_bookshop_items_is_published")
                    .col(BookshopItems::IsPublished)
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
                    .table(BookshopItems::Table)
                    .name("idx_bookshop_items_is_published")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_index(
                Index::drop()
                    .if_exists()
                    .table(BookshopItems::Table)
                    .name("idx_bookshop_items_document_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(BookshopItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum BookshopItems {
    Table,
    Id,
    DocumentId,
    Title,
    PriceCents,
    IsPublished,
    CreatedBy,
    CreatedAt,
    UpdatedAt,
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
