// studyroom-backend/src/repository/mod.rs

pub mod auth_token_repository;
pub mod document_page_repository;
pub mod document_repository;
pub mod document_share_repository;
pub mod share_link_repository;
pub mod study_room_repository;
pub mod user_repository;
pub mod view_analytics_repository;
