use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(StudyRoomItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudyRoomItems::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudyRoomItems::UserId).uuid().not_null())
                    .col(
                        ColumnDef::new(StudyRoomItems::BookshopItemId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(StudyRoomItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_study_room_items_user_id")
                            .from(StudyRoomItems::Table, StudyRoomItems::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_study_room_items_bookshop_item_id")
                            .from(StudyRoomItems::Table, StudyRoomItems::BookshopItemId)
                            .to(BookshopItems::Table, BookshopItems::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::NoAction),
                    )
                    .to_owned(),
            )
            .await?;

        // 同じアイテムの二重追加を防止
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .table(StudyRoomItems::Table)
                    .name("idx_study_room_items_user_id_bookshop_item_id")
                    .col(StudyRoomItems::UserId)
                    .col(StudyRoomItems::BookshopItemId)
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
                    .table(StudyRoomItems::Table)
                    .name("idx_study_room_items_user_id_bookshop_item_id")
                    .to_owned(),
            )
            .await?;

        manager
            .drop_table(Table::drop().table(StudyRoomItems::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum StudyRoomItems {
    Table,
    Id,
    UserId,
    BookshopItemId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum BookshopItems {
    Table,
    Id,
}
