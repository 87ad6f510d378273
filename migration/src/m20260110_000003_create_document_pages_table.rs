use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DocumentPages::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DocumentPages::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(DocumentPages::DocumentId).uuid().not_null())
                    .col(
                        ColumnDef::new(DocumentPages::PageNumber)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentPages::StorageKey)
                            .string_len(512)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentPages::Format)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentPages::FileSize)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DocumentPages::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_document_pages_document_id")
                            .from(DocumentPages::Table, DocumentPages::DocumentId)
                            .to(Documents::Table, Documents::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // (document_id, page_number) は一意
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(DocumentPages::Table)
                    .name("idx_document_pages_document_id_page_number")
                    .col(DocumentPages::DocumentId)
                    .col(DocumentPages::PageNumber)
                    .unique()
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
                    .table(DocumentPages::Table)
                    .name("idx_document_pages_document_id_page_number")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(DocumentPages::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DocumentPages {
    Table,
    Id,
    DocumentId,
    PageNumber,
    StorageKey,
    Format,
    FileSize,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Documents {
    Table,
    Id,
}
