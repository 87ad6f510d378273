// studyroom-backend/src/api/dto/mod.rs

pub mod auth_dto;
pub mod document_dto;
pub mod inbox_dto;
pub mod share_dto;
pub mod studyroom_dto;
