//! Service layer: registration flow orchestration.
//!
//! [`LobbyService`] coordinates check-in, check-out, and lookup over a
//! [`super::domain::LobbyRegistry`].

pub mod lobby_service;

pub use lobby_service::LobbyService;
