// studyroom-backend/src/api/handlers/mod.rs

pub mod auth_handler;
pub mod document_handler;
pub mod inbox_handler;
pub mod share_handler;
pub mod studyroom_handler;
