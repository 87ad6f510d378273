// studyroom-backend/src/domain/mod.rs

pub mod auth_token_model;
pub mod bookshop_item_model;
pub mod document_model;
pub mod document_page_model;
pub mod document_share_model;
pub mod role;
pub mod share_link_model;
pub mod study_room_item_model;
pub mod user_model;
pub mod view_analytics_model;
