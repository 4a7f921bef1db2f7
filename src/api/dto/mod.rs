//! Data Transfer Objects for REST request/response serialization.

pub mod lobby_dto;

pub use lobby_dto::*;
