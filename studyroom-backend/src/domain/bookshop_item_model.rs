// studyroom-backend/src/domain/bookshop_item_model.rs

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ConnectionTrait, DbErr, Set};
use serde::{Deserialize, Serialize};

/// Bookshopの出品アイテム（ドキュメントのラッパー）
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookshop_items")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub document_id: Uuid,
    pub title: String,
    pub price_cents: i32,
    pub is_published: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "crate::domain::document_model::Entity",
        from = "Column::DocumentId",
        to = "crate::domain::document_model::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Document,

    #[sea_orm(has_many = "crate::domain::study_room_item_model::Entity")]
    StudyRoomItems,
}

impl Related<crate::domain::document_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Document.def()
    }
}

impl Related<crate::domain::study_room_item_model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudyRoomItems.def()
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    fn new() -> Self {
        Self {
            id: Set(Uuid::new_v4()),
            price_cents: Set(0),
            is_published: Set(false),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
            ..ActiveModelTrait::default()
        }
    }

    async fn before_save<C>(mut self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        if !insert {
            self.updated_at = Set(Utc::now());
        }
        Ok(self)
    }
}

impl Model {
    pub fn is_free(&self) -> bool {
        self.price_cents == 0
    }
}
